use h12_core::prelude::*;

struct App;

impl Component for App {
    fn render(&self, this: &Scope) -> anyhow::Result<NodeId> {
        Ok(<><main id="app"><h1>Hello {name}</h1></main></>)
    }
}
