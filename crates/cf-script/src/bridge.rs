use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use cf_core::{FlowError, FlowResult, FlowValue, MessageContent, Sender, SourceSpan};
use cf_runtime::Params;
use rhai::{Array, Dynamic, Engine, ImmutableString, Map, Scope, FLOAT, INT};
use tracing::debug;

/// A context capability requested by a script, applied after the script returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEffect {
    Inject(String),
    GoTo(String),
    ShowToast {
        content: String,
        timeout_ms: Option<u64>,
    },
    SetText(String),
    OpenChat(bool),
}

pub(crate) fn flow_value_to_dynamic(value: &FlowValue) -> Dynamic {
    match value {
        FlowValue::Null => Dynamic::UNIT,
        FlowValue::Bool(value) => Dynamic::from_bool(*value),
        FlowValue::Number(value) => Dynamic::from_float(*value as FLOAT),
        FlowValue::String(value) => Dynamic::from(value.clone()),
        FlowValue::Array(values) => {
            Dynamic::from_array(values.iter().map(flow_value_to_dynamic).collect::<Array>())
        }
        FlowValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.as_str().into(), flow_value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub(crate) fn dynamic_to_flow_value(value: Dynamic) -> FlowResult<FlowValue> {
    if value.is_unit() {
        return Ok(FlowValue::Null);
    }
    if value.is::<bool>() {
        return Ok(FlowValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(FlowValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(FlowValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(FlowValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(FlowValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_flow_value(item)?);
        }
        return Ok(FlowValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_flow_value(value)?);
        }
        return Ok(FlowValue::Map(out));
    }

    Err(FlowError::new(
        "SCRIPT_VALUE_UNSUPPORTED",
        format!("Unsupported Rhai value type \"{}\".", value.type_name()),
    ))
}

fn optional_text(value: &Option<String>) -> Dynamic {
    value
        .as_ref()
        .map(|text| Dynamic::from(text.clone()))
        .unwrap_or(Dynamic::UNIT)
}

/// One engine and scope for a single attribute evaluation.
pub(crate) struct ScriptRun {
    engine: Engine,
    scope: Scope<'static>,
    effects: Rc<RefCell<Vec<ScriptEffect>>>,
}

impl ScriptRun {
    pub(crate) fn new(params: &Params) -> Self {
        let effects = Rc::new(RefCell::new(Vec::new()));
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        register_effects(&mut engine, &effects);

        let mut scope = Scope::new();
        scope.push_dynamic("userInput", optional_text(&params.user_input));
        scope.push_dynamic("currPath", optional_text(&params.curr_path));
        scope.push_dynamic("prevPath", optional_text(&params.prev_path));

        Self {
            engine,
            scope,
            effects,
        }
    }

    pub(crate) fn eval(&mut self, source: &str) -> FlowResult<FlowValue> {
        let value = self
            .engine
            .eval_with_scope::<Dynamic>(&mut self.scope, source)
            .map_err(|error| {
                FlowError::new("SCRIPT_EVAL_ERROR", format!("Script eval failed: {}", error))
            })?;
        dynamic_to_flow_value(value)
    }

    pub(crate) fn finish(self) -> Vec<ScriptEffect> {
        self.effects.take()
    }
}

fn register_effects(engine: &mut Engine, effects: &Rc<RefCell<Vec<ScriptEffect>>>) {
    let sink = Rc::clone(effects);
    engine.register_fn("inject", move |text: Dynamic| {
        sink.borrow_mut().push(ScriptEffect::Inject(text.to_string()));
    });
    let sink = Rc::clone(effects);
    engine.register_fn("go_to", move |path: ImmutableString| {
        sink.borrow_mut().push(ScriptEffect::GoTo(path.to_string()));
    });
    let sink = Rc::clone(effects);
    engine.register_fn("show_toast", move |content: Dynamic| {
        sink.borrow_mut().push(ScriptEffect::ShowToast {
            content: content.to_string(),
            timeout_ms: None,
        });
    });
    let sink = Rc::clone(effects);
    engine.register_fn("show_toast", move |content: Dynamic, timeout_ms: INT| {
        sink.borrow_mut().push(ScriptEffect::ShowToast {
            content: content.to_string(),
            timeout_ms: u64::try_from(timeout_ms).ok(),
        });
    });
    let sink = Rc::clone(effects);
    engine.register_fn("set_text", move |value: Dynamic| {
        sink.borrow_mut().push(ScriptEffect::SetText(value.to_string()));
    });
    let sink = Rc::clone(effects);
    engine.register_fn("open_chat", move |is_open: bool| {
        sink.borrow_mut().push(ScriptEffect::OpenChat(is_open));
    });
}

/// Executes collected effects in order through the context.
pub(crate) async fn apply_effects(effects: Vec<ScriptEffect>, params: &Params) -> FlowResult<()> {
    for effect in effects {
        debug!(?effect, "applying script effect");
        match effect {
            ScriptEffect::Inject(text) => {
                params
                    .inject_message(MessageContent::Text { text }, Sender::Bot)
                    .await?;
            }
            ScriptEffect::GoTo(path) => {
                params.go_to_path(&path).await?;
            }
            ScriptEffect::ShowToast {
                content,
                timeout_ms,
            } => {
                params.show_toast(&content, timeout_ms).await?;
            }
            ScriptEffect::SetText(value) => params.set_text_area_value(&value).await?,
            ScriptEffect::OpenChat(is_open) => params.open_chat(is_open).await?,
        }
    }
    Ok(())
}

/// Checks script syntax without running it.
pub(crate) fn check_syntax(source: &str, span: &SourceSpan) -> FlowResult<()> {
    Engine::new().compile(source).map(|_| ()).map_err(|error| {
        FlowError::with_span(
            "FLOW_SCRIPT_SYNTAX",
            format!("Script does not compile: {}", error),
            span.clone(),
        )
    })
}

/// A Rhai snippet attached to a block attribute.
#[derive(Debug, Clone)]
pub struct ScriptFn {
    source: Arc<str>,
}

impl ScriptFn {
    pub fn compile(source: &str, span: &SourceSpan) -> FlowResult<Self> {
        check_syntax(source, span)?;
        Ok(Self {
            source: Arc::from(source),
        })
    }

    /// Runs the script synchronously, returning its value and the effects it asked for.
    pub fn evaluate(&self, params: &Params) -> FlowResult<(FlowValue, Vec<ScriptEffect>)> {
        let mut run = ScriptRun::new(params);
        let value = run.eval(&self.source)?;
        Ok((value, run.finish()))
    }

    pub async fn run(&self, params: &Params) -> FlowResult<FlowValue> {
        let (value, effects) = self.evaluate(params)?;
        apply_effects(effects, params).await?;
        Ok(value)
    }
}
