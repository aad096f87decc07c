use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::Cursor;
use xmltree::Element;

use crate::block::{self, BlockNode};
use crate::tag::{self, SemanticTag, VarRef};

const INDENT_WIDTH: usize = 4;

/// Result of converting one block document.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub lines: Vec<String>,
    pub blocks_emitted: usize,
}

/// Parses block XML text and converts it. A document that is not
/// well-formed XML is the one error this module surfaces; everything wrong
/// inside a parseable document degrades to skipped nodes or placeholder
/// lines instead.
pub fn convert_source(source: &str) -> Result<Conversion> {
    let root = Element::parse(Cursor::new(source.as_bytes()))
        .map_err(|e| anyhow!("Input is not well-formed block XML: {}.", e))?;
    Ok(convert_document(&root))
}

/// Walks every procedure definition in the document and emits its statement
/// chain. A document without a single procedure stack yields an empty
/// conversion and one stderr diagnostic.
pub fn convert_document(root: &Element) -> Conversion {
    let procedures = block::find_procedures(root);
    let mut found_stack = false;
    let mut emitter = Emitter::new();
    for procedure in &procedures {
        if !procedure.has_stack {
            continue;
        }
        found_stack = true;
        emitter.params = procedure
            .params
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        if let Some(body) = procedure.body {
            emitter.emit_chain(body, 0);
        }
    }
    if !found_stack {
        eprintln!("No statement stack found inside a procedures_defnoreturn block.");
        return Conversion::default();
    }
    Conversion {
        lines: emitter.lines,
        blocks_emitted: emitter.blocks_emitted,
    }
}

/// Per-conversion emission state: the ordered output buffer, the emitted
/// block counter, and the parameter alias table of the procedure whose body
/// is currently being walked. One `Emitter` never outlives one document.
struct Emitter {
    lines: Vec<String>,
    blocks_emitted: usize,
    params: HashMap<String, usize>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            blocks_emitted: 0,
            params: HashMap::new(),
        }
    }

    fn emit_chain(&mut self, head: BlockNode<'_>, level: usize) {
        for node in head.chain() {
            self.emit_block(&node, level);
        }
    }

    fn emit_block(&mut self, node: &BlockNode<'_>, level: usize) {
        let Some(resolved) = tag::resolve(node) else {
            // property block stripped of its set_or_get metadata
            return;
        };
        match resolved {
            SemanticTag::MethodCall => self.emit_method_call(node, level),
            SemanticTag::SetProperty => self.emit_set_property(node, level),
            SemanticTag::LocalDeclaration => self.emit_local_declaration(node, level),
            SemanticTag::ForRangeLoop => self.emit_for_range(node, level),
            SemanticTag::VariableSet => self.emit_variable_set(node, level),
            other => {
                self.blocks_emitted += 1;
                self.push_line(level, format!("// Unknown: {}", other.display_name()));
            }
        }
    }

    fn emit_method_call(&mut self, node: &BlockNode<'_>, level: usize) {
        if node.mutation().is_none() {
            return;
        }
        self.blocks_emitted += 1;
        match self.method_call_expr(node) {
            Some(call) => self.push_line(level, format!("{call};")),
            None => self.push_line(
                level,
                "// Skipped component_method: missing instance or method name".to_string(),
            ),
        }
    }

    fn emit_set_property(&mut self, node: &BlockNode<'_>, level: usize) {
        self.blocks_emitted += 1;
        let Some(component) = node.mutation_attr("instance_name") else {
            self.push_line(level, "// Skipped SetProperty: missing instance name".to_string());
            return;
        };
        let Some(property) = node.field_text("PROP") else {
            self.push_line(level, "// Skipped SetProperty: missing PROP field".to_string());
            return;
        };
        let Some(value_node) = node.slot("VALUE") else {
            self.push_line(level, "// Skipped SetProperty: missing VALUE".to_string());
            return;
        };
        let value = self.value_of(&value_node);
        self.push_line(
            level,
            format!("SetProperty(GetComponentByName(\"{component}\"), \"{property}\", {value});"),
        );
    }

    /// `{` marker, one typed declaration per VAR{i}/DECL{i} pair, the nested
    /// body chain, `}` marker. The first missing pair ends the declaration
    /// list; a pair whose slot holds no initializer block is passed over.
    fn emit_local_declaration(&mut self, node: &BlockNode<'_>, level: usize) {
        self.blocks_emitted += 1;
        self.push_line(level, "{".to_string());
        let mut index = 0;
        loop {
            let name = node.field_text(&format!("VAR{index}"));
            let slot_present = node.slot_element(&format!("DECL{index}")).is_some();
            let (Some(name), true) = (name, slot_present) else {
                break;
            };
            if let Some(init) = node.slot(&format!("DECL{index}")) {
                let declared = declared_type(init.raw_tag());
                let value = self.value_of(&init);
                self.push_line(level + 1, format!("{declared} {} = {value};", name.trim()));
            }
            index += 1;
        }
        if let Some(body) = node.slot("STACK") {
            self.emit_chain(body, level + 1);
        }
        self.push_line(level, "}".to_string());
    }

    fn emit_for_range(&mut self, node: &BlockNode<'_>, level: usize) {
        self.blocks_emitted += 1;
        let var = node
            .field_text("VAR")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "i".to_string());
        let start = self.bound_expr(node, "START");
        let end = self.bound_expr(node, "END");
        let step = self.bound_expr(node, "STEP");
        self.push_line(
            level,
            format!("for (int {var} = {start}; {var} <= {end}; {var} += {step}) {{"),
        );
        if let Some(body) = node.slot("DO") {
            self.emit_chain(body, level + 1);
        }
        self.push_line(level, "}".to_string());
    }

    fn emit_variable_set(&mut self, node: &BlockNode<'_>, level: usize) {
        self.blocks_emitted += 1;
        let Some(raw_name) = node.field_text("VAR") else {
            self.push_line(level, "// Skipped lexical_variable_set: missing VAR field".to_string());
            return;
        };
        let Some(value_node) = node.slot("VALUE") else {
            self.push_line(level, "// Skipped lexical_variable_set: missing VALUE".to_string());
            return;
        };
        let name = raw_name.strip_prefix("global ").unwrap_or(&raw_name).to_string();
        let assignment = format!("{name} = {}", self.value_of(&value_node));
        self.push_line(level, format!("{assignment};"));
    }

    /// Shared call-expression builder: statement emission appends the
    /// terminator, expression positions embed the result as-is.
    fn method_call_expr(&mut self, node: &BlockNode<'_>) -> Option<String> {
        let component = node.mutation_attr("instance_name")?;
        let method = node.mutation_attr("method_name")?;
        let args = self.argument_list(node);
        Some(format!(
            "Invoke(GetComponentByName(\"{component}\"), \"{method}\", {args})"
        ))
    }

    fn value_of(&mut self, node: &BlockNode<'_>) -> String {
        let Some(resolved) = tag::resolve(node) else {
            return placeholder_expr(node.raw_tag());
        };
        match resolved {
            SemanticTag::TextLiteral => {
                format!("\"{}\"", node.field_text("TEXT").unwrap_or_default())
            }
            SemanticTag::NumberLiteral => {
                parse_int_lenient(&node.field_text("NUM").unwrap_or_default()).to_string()
            }
            SemanticTag::BooleanLiteral => {
                node.field_text("BOOL").unwrap_or_default().to_lowercase()
            }
            SemanticTag::GetComponent => match node.mutation_attr("instance_name") {
                Some(name) => format!("GetComponentByName(\"{name}\")"),
                None => placeholder_expr("GetComponent"),
            },
            SemanticTag::GetProperty => {
                match (
                    node.mutation_attr("instance_name"),
                    node.mutation_attr("property_name"),
                ) {
                    (Some(component), Some(property)) => format!(
                        "GetProperty(GetComponentByName(\"{component}\"), \"{property}\")"
                    ),
                    _ => placeholder_expr("GetProperty"),
                }
            }
            SemanticTag::VariableGet => self.variable_get_expr(node),
            SemanticTag::ListLiteral => self.list_literal(node),
            SemanticTag::StringJoin => self.string_join(node),
            SemanticTag::MethodCall => self
                .method_call_expr(node)
                .unwrap_or_else(|| placeholder_expr("component_method")),
            other => placeholder_expr(other.display_name()),
        }
    }

    fn variable_get_expr(&self, node: &BlockNode<'_>) -> String {
        let Some(text) = node.field_text("VAR") else {
            return placeholder_expr("lexical_variable_get");
        };
        match VarRef::parse(&text) {
            VarRef::Component(name) => format!("GetComponentByName(\"{name}\")"),
            VarRef::Param(index) => format!("paramValues.get({index})"),
            VarRef::Global(name) => name,
            VarRef::Local(name) => match self.params.get(&name) {
                Some(index) => format!("paramValues.get({index})"),
                None => name,
            },
        }
    }

    fn argument_list(&mut self, node: &BlockNode<'_>) -> String {
        let items = self.indexed_slots(node, "ARG");
        format!("new Object[]{{{}}}", items.join(", "))
    }

    fn list_literal(&mut self, node: &BlockNode<'_>) -> String {
        let items = self.indexed_slots(node, "ADD");
        format!("MakeList(new Object[]{{{}}})", items.join(", "))
    }

    fn string_join(&mut self, node: &BlockNode<'_>) -> String {
        let items = self.indexed_slots(node, "ADD");
        if items.is_empty() {
            "\"\"".to_string()
        } else {
            items.join(" + ")
        }
    }

    /// Collects `PREFIX0, PREFIX1, ...` slot expressions in index order. The
    /// first missing slot ends the list; gapped indices are truncated.
    fn indexed_slots(&mut self, node: &BlockNode<'_>, prefix: &str) -> Vec<String> {
        let mut items = Vec::new();
        let mut index = 0;
        while let Some(inner) = node.slot(&format!("{prefix}{index}")) {
            items.push(self.value_of(&inner));
            index += 1;
        }
        items
    }

    fn bound_expr(&mut self, node: &BlockNode<'_>, slot: &str) -> String {
        match node.slot(slot) {
            Some(inner) => self.value_of(&inner),
            None => "0".to_string(),
        }
    }

    fn push_line(&mut self, level: usize, text: String) {
        self.lines.push(format!("{}{}", pad(level), text));
    }
}

fn placeholder_expr(name: &str) -> String {
    format!("null /* Unknown: {name} */")
}

/// Declared Java type for a local declaration, keyed on the initializer's
/// raw discriminant.
fn declared_type(raw_tag: &str) -> &'static str {
    match raw_tag {
        "text" => "String",
        "math_number" => "int",
        _ => "Object",
    }
}

/// `parseInt`-style read: optional sign plus leading base-10 digits;
/// anything else yields 0 rather than an error.
fn parse_int_lenient(text: &str) -> i64 {
    let trimmed = text.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

fn pad(level: usize) -> String {
    " ".repeat(level * INDENT_WIDTH)
}
