use std::collections::BTreeMap;
use std::sync::Arc;

use cf_core::{Component, FlowError, FlowResult, FlowValue};
use cf_parser::{parse_xml_document, XmlElementNode};
use cf_runtime::{
    Attribute, Block, Callback, CheckboxesSpec, Flow, OptionsSpec, TransitionSpec, START_PATH,
};
use tracing::debug;

use crate::bridge::ScriptFn;
use crate::convert::{
    to_checkboxes, to_component, to_flag, to_function_result, to_message, to_options, to_path,
    to_transition,
};
use crate::template::MessageTemplate;

/// Compiles a set of `*.flow.xml` sources, keyed by file name, into one flow.
pub fn compile_flow_from_xml_map(files: &BTreeMap<String, String>) -> FlowResult<Flow> {
    let mut flow = Flow::new();
    let mut origins: BTreeMap<String, &str> = BTreeMap::new();

    for (file, source) in files {
        let document = parse_xml_document(source).map_err(|error| in_file(error, file))?;
        let root = &document.root;
        if root.name != "flow" {
            return Err(in_file(
                root.error(
                    "FLOW_ROOT_INVALID",
                    format!("Expected <flow> root, found <{}>.", root.name),
                ),
                file,
            ));
        }
        reject_stray_text(root).map_err(|error| in_file(error, file))?;

        for element in root.child_elements() {
            if element.name != "block" {
                return Err(in_file(unknown_element(element, "flow"), file));
            }
            let path = element
                .attr("path")
                .filter(|path| !path.is_empty())
                .ok_or_else(|| {
                    in_file(
                        element.error("FLOW_BLOCK_PATH_MISSING", "<block> requires a path."),
                        file,
                    )
                })?;
            if let Some(previous) = origins.get(path) {
                return Err(element.error(
                    "FLOW_DUPLICATE_PATH",
                    format!(
                        "Block \"{}\" is defined in both {} and {}.",
                        path, previous, file
                    ),
                ));
            }
            let block = compile_block(element).map_err(|error| in_file(error, file))?;
            debug!(path, file = %file, "compiled block");
            flow.insert(path, block);
            origins.insert(path.to_string(), file.as_str());
        }
    }

    if !flow.contains(START_PATH) {
        return Err(FlowError::new(
            "FLOW_START_MISSING",
            format!("No file defines a \"{}\" block.", START_PATH),
        ));
    }
    Ok(flow)
}

pub fn compile_flow_from_xml(source: &str) -> FlowResult<Flow> {
    let files = BTreeMap::from([("main.flow.xml".to_string(), source.to_string())]);
    compile_flow_from_xml_map(&files)
}

fn in_file(mut error: FlowError, file: &str) -> FlowError {
    error.message = format!("{} ({})", error.message, file);
    error
}

fn unknown_element(element: &XmlElementNode, parent: &str) -> FlowError {
    element.error(
        "FLOW_UNKNOWN_ELEMENT",
        format!("<{}> is not allowed inside <{}>.", element.name, parent),
    )
}

fn reject_stray_text(element: &XmlElementNode) -> FlowResult<()> {
    match element.stray_text() {
        Some(text) => Err(FlowError::with_span(
            "FLOW_TEXT_UNEXPECTED",
            format!("Unexpected text inside <{}>.", element.name),
            text.location.clone(),
        )),
        None => Ok(()),
    }
}

fn compile_block(element: &XmlElementNode) -> FlowResult<Block> {
    reject_stray_text(element)?;
    let mut block = Block::new();
    let mut seen: Vec<&str> = Vec::new();

    for child in element.child_elements() {
        if seen.contains(&child.name.as_str()) {
            return Err(child.error(
                "FLOW_DUPLICATE_ATTRIBUTE",
                format!("<{}> appears more than once in a block.", child.name),
            ));
        }
        seen.push(child.name.as_str());

        match child.name.as_str() {
            "message" => block.message = Some(compile_message(child)?),
            "options" => block.options = Some(compile_options(child)?),
            "checkboxes" => block.checkboxes = Some(compile_checkboxes(child)?),
            "component" => block.component = Some(compile_component(child)?),
            "chat-disabled" => block.chat_disabled = Some(compile_flag(child)?),
            "sensitive" => block.is_sensitive = Some(compile_flag(child)?),
            "transition" => block.transition = Some(compile_transition(child)?),
            "function" => block.function = Some(compile_function(child)?),
            "path" => block.path = Some(compile_path(child)?),
            _ => return Err(unknown_element(child, "block")),
        }
    }

    if block.is_empty() {
        return Err(element.error("FLOW_BLOCK_EMPTY", "<block> declares no attributes."));
    }
    Ok(block)
}

fn scripted<T, F>(script: ScriptFn, convert: F) -> Attribute<T>
where
    T: Send + 'static,
    F: Fn(FlowValue) -> Option<T> + Send + Sync + 'static,
{
    let convert = Arc::new(convert);
    Attribute::from_async(move |params| {
        let script = script.clone();
        let convert = Arc::clone(&convert);
        async move {
            let value = script.run(&params).await?;
            Ok::<_, FlowError>(convert(value))
        }
    })
}

fn script_of(element: &XmlElementNode) -> FlowResult<Option<ScriptFn>> {
    element
        .attr("script")
        .map(|source| ScriptFn::compile(source, &element.location))
        .transpose()
}

fn parse_bool(element: &XmlElementNode, name: &str, raw: &str) -> FlowResult<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(element.error(
            "FLOW_ATTRIBUTE_INVALID",
            format!("{} must be true or false, found \"{}\".", name, other),
        )),
    }
}

fn bool_attr(element: &XmlElementNode, name: &str) -> FlowResult<Option<bool>> {
    element
        .attr(name)
        .map(|raw| parse_bool(element, name, raw))
        .transpose()
}

fn count_attr(element: &XmlElementNode, name: &str) -> FlowResult<Option<usize>> {
    element
        .attr(name)
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                element.error(
                    "FLOW_ATTRIBUTE_INVALID",
                    format!("{} must be a non-negative integer, found \"{}\".", name, raw),
                )
            })
        })
        .transpose()
}

fn option_items(element: &XmlElementNode) -> FlowResult<Vec<String>> {
    reject_stray_text(element)?;
    element
        .child_elements()
        .map(|child| {
            if child.name == "option" {
                Ok(child.text().trim().to_string())
            } else {
                Err(unknown_element(child, &element.name))
            }
        })
        .collect()
}

fn compile_message(element: &XmlElementNode) -> FlowResult<Attribute<String>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_message));
    }
    let text = element.text().trim().to_string();
    if !MessageTemplate::is_template(&text) {
        return Ok(Attribute::Value(text));
    }
    let template = MessageTemplate::compile(&text, &element.location)?;
    Ok(Attribute::from_async(move |params| {
        let template = template.clone();
        async move { template.render(&params).await.map(Some) }
    }))
}

fn compile_options(element: &XmlElementNode) -> FlowResult<Attribute<OptionsSpec>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_options));
    }
    Ok(Attribute::Value(OptionsSpec {
        items: option_items(element)?,
        send_output: bool_attr(element, "send-output")?,
        reusable: bool_attr(element, "reusable")?,
    }))
}

fn compile_checkboxes(element: &XmlElementNode) -> FlowResult<Attribute<CheckboxesSpec>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_checkboxes));
    }
    Ok(Attribute::Value(CheckboxesSpec {
        items: option_items(element)?,
        min: count_attr(element, "min")?,
        max: count_attr(element, "max")?,
        send_output: bool_attr(element, "send-output")?,
        reusable: bool_attr(element, "reusable")?,
    }))
}

fn compile_component(element: &XmlElementNode) -> FlowResult<Attribute<Component>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_component));
    }
    let kind = element
        .attr("kind")
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| element.error("FLOW_ATTRIBUTE_MISSING", "<component> requires a kind."))?;
    let body = element.text();
    let props = if body.trim().is_empty() {
        FlowValue::Null
    } else {
        let json = serde_json::from_str::<serde_json::Value>(&body).map_err(|error| {
            element.error(
                "FLOW_COMPONENT_PROPS_INVALID",
                format!("Component props must be JSON: {}", error),
            )
        })?;
        FlowValue::from_json(json)
    };
    Ok(Attribute::Value(Component::new(kind).with_props(props)))
}

fn compile_flag(element: &XmlElementNode) -> FlowResult<Attribute<bool>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_flag));
    }
    let text = element.text();
    let raw = if text.trim().is_empty() { "true" } else { text.as_str() };
    Ok(Attribute::Value(parse_bool(element, &element.name, raw)?))
}

fn compile_transition(element: &XmlElementNode) -> FlowResult<Attribute<TransitionSpec>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_transition));
    }
    let raw = element.attr("duration").ok_or_else(|| {
        element.error(
            "FLOW_ATTRIBUTE_MISSING",
            "<transition> requires a duration or a script.",
        )
    })?;
    let duration = raw.trim().parse::<f64>().map_err(|_| {
        element.error(
            "FLOW_ATTRIBUTE_INVALID",
            format!("duration must be a number of milliseconds, found \"{}\".", raw),
        )
    })?;
    Ok(Attribute::Value(TransitionSpec {
        duration: Some(duration),
        interruptable: bool_attr(element, "interruptable")?,
    }))
}

fn compile_function(element: &XmlElementNode) -> FlowResult<Callback<FlowValue>> {
    let code = element.text();
    if code.trim().is_empty() {
        return Err(element.error("FLOW_FUNCTION_EMPTY", "<function> has no code."));
    }
    let script = ScriptFn::compile(&code, &element.location)?;
    Ok(Callback::asynchronous(move |params| {
        let script = script.clone();
        async move {
            let value = script.run(&params).await?;
            Ok::<_, FlowError>(to_function_result(value))
        }
    }))
}

fn compile_path(element: &XmlElementNode) -> FlowResult<Attribute<String>> {
    if let Some(script) = script_of(element)? {
        return Ok(scripted(script, to_path));
    }
    Ok(Attribute::Value(element.text().trim().to_string()))
}
