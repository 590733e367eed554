//! Runners compiled into the harness

use cc_plugin::{register_action, ActionContext, ActionRunner, DataSourceOpInput, RunnerError};

/// `copy`: stream one output data source into another
///
/// Attributes: `source`, `destination` (data-source names) and optional
/// `source_key` / `destination_key` (path keys, default `default`).
#[derive(Debug, Default)]
pub(crate) struct CopyAction;

impl ActionRunner for CopyAction {
    fn run(&mut self, ctx: &ActionContext<'_>) -> Result<(), RunnerError> {
        let attrs = ctx.attributes();
        let required = |name: &str| {
            attrs
                .get_str(name)
                .map(str::to_string)
                .ok_or_else(|| format!("copy action requires attribute '{name}'"))
        };

        let src = DataSourceOpInput::named(required("source")?, attrs.get_string_or_default("source_key", "default"));
        let dest = DataSourceOpInput::named(
            required("destination")?,
            attrs.get_string_or_default("destination_key", "default"),
        );

        let written = ctx.copy(&src, &dest)?;
        ctx.log(&format!("copied {written} bytes"));
        Ok(())
    }
}

/// `log-attributes`: log every attribute of the action
#[derive(Debug, Default)]
pub(crate) struct LogAttributes;

impl ActionRunner for LogAttributes {
    fn run(&mut self, ctx: &ActionContext<'_>) -> Result<(), RunnerError> {
        for (name, value) in ctx.attributes().iter() {
            ctx.log(&format!("{name} = {value}"));
        }
        Ok(())
    }

    fn continue_on_error(&self) -> bool {
        true
    }
}

/// Register the built-in runners in the process-wide registry
pub(crate) fn register_builtin_actions() {
    register_action("copy", || Box::new(CopyAction));
    register_action("log-attributes", || Box::new(LogAttributes));
}
