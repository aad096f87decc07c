use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn convert_blocks_to_java(source: &str) -> Result<String, JsValue> {
    crate::convert_source_to_java_lines(source)
        .map(|lines| lines.join("\n"))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn convert_blocks_to_java_with_conditions(
    source: &str,
    conditions: &str,
) -> Result<String, JsValue> {
    let conditions = crate::conditions::parse_conditions_text(conditions)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let lines = crate::convert_source_to_java_lines(source)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(lines
        .iter()
        .map(|line| crate::conditions::apply_conditions(line, &conditions))
        .collect::<Vec<_>>()
        .join("\n"))
}
