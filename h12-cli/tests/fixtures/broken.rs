fn render(this: &Scope) -> NodeId {
    <><a></a><b></b></>
}
