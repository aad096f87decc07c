use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use xmltree::{Element, XMLNode};

/// One ordered find/replace pair of the post-processing pass. Matching is
/// literal substring matching, no regex semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub old_value: String,
    pub new_value: String,
}

/// Applies each pair in list order, exhausting one pair before the next:
/// replacement repeats until no occurrence of `old_value` remains. A pair
/// whose replacement reintroduces its own needle is bounded to a single
/// replace-all round so the pass always terminates.
pub fn apply_conditions(text: &str, conditions: &[Condition]) -> String {
    let mut text = text.to_string();
    for condition in conditions {
        if condition.old_value.is_empty() {
            continue;
        }
        while text.contains(&condition.old_value) {
            text = text.replace(&condition.old_value, &condition.new_value);
            if condition.new_value.contains(&condition.old_value) {
                break;
            }
        }
    }
    text
}

/// Reads a conditions file. `.json` files hold
/// `[{"oldValue": ..., "newValue": ...}, ...]`; anything else is parsed as
/// the XML form (`<condition><oldValue>...</oldValue><newValue>...</newValue>`).
pub fn load_conditions(path: &Path) -> Result<Vec<Condition>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read conditions file '{}'.", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_conditions_json(&text)
    } else {
        parse_conditions_xml(&text)
    }
    .with_context(|| format!("Invalid conditions file '{}'.", path.display()))
}

/// Parses conditions text of either serialized form, JSON first.
pub fn parse_conditions_text(text: &str) -> Result<Vec<Condition>> {
    if text.trim_start().starts_with('[') {
        parse_conditions_json(text)
    } else {
        parse_conditions_xml(text)
    }
}

pub fn parse_conditions_json(text: &str) -> Result<Vec<Condition>> {
    let parsed: Value = serde_json::from_str(text).context("Conditions JSON does not parse.")?;
    let entries = parsed
        .as_array()
        .ok_or_else(|| anyhow!("Conditions JSON must be an array of pairs."))?;
    let mut conditions = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let old_value = entry
            .get("oldValue")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Condition {} is missing 'oldValue'.", index + 1))?;
        let new_value = entry
            .get("newValue")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Condition {} is missing 'newValue'.", index + 1))?;
        conditions.push(Condition {
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
        });
    }
    Ok(conditions)
}

pub fn parse_conditions_xml(text: &str) -> Result<Vec<Condition>> {
    let root = Element::parse(Cursor::new(text.as_bytes()))
        .map_err(|e| anyhow!("Conditions XML does not parse: {}.", e))?;
    let mut conditions = Vec::new();
    collect_condition_elements(&root, &mut conditions)?;
    Ok(conditions)
}

fn collect_condition_elements(element: &Element, conditions: &mut Vec<Condition>) -> Result<()> {
    if element.name == "condition" {
        conditions.push(condition_from_element(element)?);
        return Ok(());
    }
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        collect_condition_elements(child, conditions)?;
    }
    Ok(())
}

fn condition_from_element(element: &Element) -> Result<Condition> {
    let old_value = element
        .get_child("oldValue")
        .ok_or_else(|| anyhow!("A <condition> is missing its <oldValue> element."))?;
    let new_value = element
        .get_child("newValue")
        .ok_or_else(|| anyhow!("A <condition> is missing its <newValue> element."))?;
    Ok(Condition {
        old_value: element_text(old_value),
        new_value: element_text(new_value),
    })
}

fn element_text(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}
