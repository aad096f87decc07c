use crate::block::BlockNode;

/// Normalized block classification. Raw discriminants the converter has no
/// emission rule for pass through as `Unknown` and degrade to placeholder
/// output instead of failing the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticTag {
    MethodCall,
    GetProperty,
    SetProperty,
    GetComponent,
    TextLiteral,
    NumberLiteral,
    BooleanLiteral,
    VariableGet,
    VariableSet,
    ListLiteral,
    StringJoin,
    LocalDeclaration,
    ForRangeLoop,
    Unknown(String),
}

impl SemanticTag {
    /// Name used in placeholder output for blocks without an emission rule.
    pub fn display_name(&self) -> &str {
        match self {
            SemanticTag::MethodCall => "component_method",
            SemanticTag::GetProperty => "GetProperty",
            SemanticTag::SetProperty => "SetProperty",
            SemanticTag::GetComponent => "GetComponent",
            SemanticTag::TextLiteral => "text",
            SemanticTag::NumberLiteral => "number",
            SemanticTag::BooleanLiteral => "boolean",
            SemanticTag::VariableGet => "lexical_variable_get",
            SemanticTag::VariableSet => "lexical_variable_set",
            SemanticTag::ListLiteral => "list",
            SemanticTag::StringJoin => "join",
            SemanticTag::LocalDeclaration => "local_declaration_statement",
            SemanticTag::ForRangeLoop => "controls_forRange",
            SemanticTag::Unknown(raw) => raw,
        }
    }
}

/// Classifies a block by its raw discriminant. The one context-sensitive
/// case is `component_set_get`, whose meaning lives in the `set_or_get`
/// mutation attribute: without a mutation the block carries no usable
/// metadata and resolution fails, so the caller must skip it.
pub fn resolve(node: &BlockNode<'_>) -> Option<SemanticTag> {
    let tag = match node.raw_tag() {
        "component_method" => SemanticTag::MethodCall,
        "component_set_get" => match node.mutation_attr("set_or_get")? {
            "get" => SemanticTag::GetProperty,
            _ => SemanticTag::SetProperty,
        },
        "component_component_block" => SemanticTag::GetComponent,
        "text" => SemanticTag::TextLiteral,
        "math_number" => SemanticTag::NumberLiteral,
        "logic_boolean" => SemanticTag::BooleanLiteral,
        "lexical_variable_get" => SemanticTag::VariableGet,
        "lexical_variable_set" => SemanticTag::VariableSet,
        "lists_create_with" => SemanticTag::ListLiteral,
        "text_join" => SemanticTag::StringJoin,
        "local_declaration_statement" => SemanticTag::LocalDeclaration,
        "controls_forRange" => SemanticTag::ForRangeLoop,
        other => SemanticTag::Unknown(other.to_string()),
    };
    Some(tag)
}

/// A `VAR` field reference, decoded from the editor's name-prefix
/// convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRef {
    Component(String),
    Param(usize),
    Global(String),
    Local(String),
}

impl VarRef {
    pub fn parse(text: &str) -> VarRef {
        if let Some(name) = text.strip_prefix("GetComponent_") {
            return VarRef::Component(name.to_string());
        }
        if let Some(rest) = text.strip_prefix("param_") {
            if let Ok(index) = rest.parse::<usize>() {
                return VarRef::Param(index);
            }
            return VarRef::Local(text.to_string());
        }
        if let Some(name) = text.strip_prefix("global ") {
            return VarRef::Global(name.to_string());
        }
        VarRef::Local(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockNode;
    use std::io::Cursor;
    use xmltree::Element;

    fn resolve_xml(xml: &str) -> Option<SemanticTag> {
        let element = Element::parse(Cursor::new(xml)).expect("test XML must parse");
        resolve(&BlockNode::new(&element))
    }

    #[test]
    fn literal_and_structural_tags_resolve_by_raw_discriminant() {
        assert_eq!(resolve_xml(r#"<block type="text"/>"#), Some(SemanticTag::TextLiteral));
        assert_eq!(
            resolve_xml(r#"<block type="math_number"/>"#),
            Some(SemanticTag::NumberLiteral)
        );
        assert_eq!(
            resolve_xml(r#"<block type="logic_boolean"/>"#),
            Some(SemanticTag::BooleanLiteral)
        );
        assert_eq!(
            resolve_xml(r#"<block type="component_component_block"/>"#),
            Some(SemanticTag::GetComponent)
        );
        assert_eq!(
            resolve_xml(r#"<block type="lists_create_with"/>"#),
            Some(SemanticTag::ListLiteral)
        );
        assert_eq!(
            resolve_xml(r#"<block type="controls_forRange"/>"#),
            Some(SemanticTag::ForRangeLoop)
        );
    }

    #[test]
    fn set_or_get_modifier_disambiguates_property_access() {
        assert_eq!(
            resolve_xml(r#"<block type="component_set_get"><mutation set_or_get="get"/></block>"#),
            Some(SemanticTag::GetProperty)
        );
        assert_eq!(
            resolve_xml(r#"<block type="component_set_get"><mutation set_or_get="set"/></block>"#),
            Some(SemanticTag::SetProperty)
        );
    }

    #[test]
    fn property_access_without_mutation_fails_resolution() {
        assert_eq!(resolve_xml(r#"<block type="component_set_get"/>"#), None);
    }

    #[test]
    fn unmapped_discriminants_pass_through_as_unknown() {
        assert_eq!(
            resolve_xml(r#"<block type="controls_if"/>"#),
            Some(SemanticTag::Unknown("controls_if".to_string()))
        );
    }

    #[test]
    fn var_prefix_convention() {
        assert_eq!(
            VarRef::parse("GetComponent_Foo"),
            VarRef::Component("Foo".to_string())
        );
        assert_eq!(VarRef::parse("param_2"), VarRef::Param(2));
        assert_eq!(VarRef::parse("global X"), VarRef::Global("X".to_string()));
        assert_eq!(VarRef::parse("counter"), VarRef::Local("counter".to_string()));
    }

    #[test]
    fn malformed_param_index_degrades_to_local() {
        assert_eq!(
            VarRef::parse("param_two"),
            VarRef::Local("param_two".to_string())
        );
    }
}
