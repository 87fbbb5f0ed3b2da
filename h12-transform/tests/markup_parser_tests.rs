use h12_transform::template_ast::Element;
use h12_transform::{MarkupParser, TransformError, TransformOptions, Transformer};

/// Ignores its input and always yields `<stub>`.
struct StubParser;

impl MarkupParser for StubParser {
    fn parse_root(&self, _markup: &str) -> Result<Element, TransformError> {
        Ok(Element {
            tag: "stub".into(),
            attrs: vec![],
            children: vec![],
            namespace: None,
        })
    }
}

#[test]
fn custom_parser_is_used() {
    let t = Transformer::with_parser(StubParser, TransformOptions::default());
    assert_eq!(
        t.transform("x = <><anything at=all></anything></>;").unwrap(),
        r#"x = this.node("stub", vec![], vec![], &[], "");"#
    );
}
