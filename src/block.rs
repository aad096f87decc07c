use xmltree::{Element, XMLNode};

/// Read-only view over one `<block>` element of an App Inventor blocks
/// document. The underlying tree stays owned by the caller; the converter
/// never mutates it.
#[derive(Debug, Clone, Copy)]
pub struct BlockNode<'a> {
    element: &'a Element,
}

impl<'a> BlockNode<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// The raw block discriminant exactly as authored by the visual editor.
    pub fn raw_tag(&self) -> &'a str {
        self.element
            .attributes
            .get("type")
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn mutation(&self) -> Option<&'a Element> {
        self.child_elements().find(|el| el.name == "mutation")
    }

    pub fn mutation_attr(&self, name: &str) -> Option<&'a str> {
        self.mutation()?.attributes.get(name).map(|s| s.as_str())
    }

    /// Text content of a named `<field>` leaf. `Some("")` when the field is
    /// present but empty, `None` when it is absent.
    pub fn field_text(&self, name: &str) -> Option<String> {
        let field = self
            .child_elements()
            .find(|el| el.name == "field" && attr_eq(el, "name", name))?;
        Some(
            field
                .get_text()
                .map(|text| text.into_owned())
                .unwrap_or_default(),
        )
    }

    /// The `<value>` or `<statement>` child carrying the given slot name.
    pub fn slot_element(&self, name: &str) -> Option<&'a Element> {
        self.child_elements().find(|el| {
            (el.name == "value" || el.name == "statement") && attr_eq(el, "name", name)
        })
    }

    /// The block plugged into a named slot, if both slot and block exist.
    pub fn slot(&self, name: &str) -> Option<BlockNode<'a>> {
        first_block_child(self.slot_element(name)?)
    }

    pub fn next(&self) -> Option<BlockNode<'a>> {
        let next = self.child_elements().find(|el| el.name == "next")?;
        first_block_child(next)
    }

    /// Materializes the `next`-linked sibling sequence starting at this
    /// block, this block first.
    pub fn chain(self) -> Vec<BlockNode<'a>> {
        let mut nodes = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            nodes.push(node);
            current = node.next();
        }
        nodes
    }

    fn child_elements(&self) -> impl Iterator<Item = &'a Element> {
        self.element.children.iter().filter_map(XMLNode::as_element)
    }
}

/// One `procedures_defnoreturn` definition found in the document: its
/// declared parameter names and the head of its statement chain. A
/// definition can carry a `STACK` slot that holds no block at all; that is
/// an empty body, not a structural failure.
#[derive(Debug, Clone)]
pub struct ProcedureDef<'a> {
    pub params: Vec<String>,
    pub has_stack: bool,
    pub body: Option<BlockNode<'a>>,
}

/// Scans the whole document for procedure definition blocks, in document
/// order.
pub fn find_procedures(root: &Element) -> Vec<ProcedureDef<'_>> {
    let mut found = Vec::new();
    collect_procedures(root, &mut found);
    found
}

fn collect_procedures<'a>(element: &'a Element, found: &mut Vec<ProcedureDef<'a>>) {
    if element.name == "block" && attr_eq(element, "type", "procedures_defnoreturn") {
        let node = BlockNode::new(element);
        found.push(ProcedureDef {
            params: parameter_names(&node),
            has_stack: node.slot_element("STACK").is_some(),
            body: node.slot("STACK"),
        });
        return;
    }
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect_procedures(child, found);
    }
}

fn parameter_names(node: &BlockNode<'_>) -> Vec<String> {
    let Some(mutation) = node.mutation() else {
        return Vec::new();
    };
    mutation
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|el| el.name == "arg")
        .filter_map(|el| el.attributes.get("name").cloned())
        .collect()
}

fn first_block_child(element: &Element) -> Option<BlockNode<'_>> {
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .find(|el| el.name == "block")
        .map(BlockNode::new)
}

fn attr_eq(element: &Element, attr: &str, expected: &str) -> bool {
    element.attributes.get(attr).map(|s| s.as_str()) == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(xml: &str) -> Element {
        Element::parse(Cursor::new(xml)).expect("test XML must parse")
    }

    #[test]
    fn chain_follows_next_links_in_order() {
        let root = parse(
            r#"<block type="a"><next><block type="b"><next><block type="c"/></next></block></next></block>"#,
        );
        let chain = BlockNode::new(&root).chain();
        let tags: Vec<&str> = chain.iter().map(|n| n.raw_tag()).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn field_text_distinguishes_empty_from_absent() {
        let root = parse(r#"<block type="text"><field name="TEXT"></field></block>"#);
        let node = BlockNode::new(&root);
        assert_eq!(node.field_text("TEXT"), Some(String::new()));
        assert_eq!(node.field_text("NUM"), None);
    }

    #[test]
    fn slot_requires_an_inner_block() {
        let root = parse(
            r#"<block type="x"><value name="ARG0"/><value name="ARG1"><block type="text"/></value></block>"#,
        );
        let node = BlockNode::new(&root);
        assert!(node.slot_element("ARG0").is_some());
        assert!(node.slot("ARG0").is_none());
        assert_eq!(node.slot("ARG1").unwrap().raw_tag(), "text");
    }

    #[test]
    fn find_procedures_reads_params_and_body() {
        let root = parse(
            r#"<xml>
                 <block type="procedures_defnoreturn">
                   <mutation><arg name="first"/><arg name="second"/></mutation>
                   <field name="NAME">doIt</field>
                   <statement name="STACK"><block type="component_method"/></statement>
                 </block>
               </xml>"#,
        );
        let procedures = find_procedures(&root);
        assert_eq!(procedures.len(), 1);
        assert_eq!(procedures[0].params, vec!["first", "second"]);
        assert!(procedures[0].has_stack);
        assert_eq!(procedures[0].body.unwrap().raw_tag(), "component_method");
    }

    #[test]
    fn find_procedures_handles_documents_without_any() {
        let root = parse(r#"<xml><block type="component_method"/></xml>"#);
        assert!(find_procedures(&root).is_empty());
    }
}
