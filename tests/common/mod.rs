//! Shared helpers for the integration suites

#![allow(dead_code)]

use arden_mlm::ast::{ExpressionNode, MlmSource, Statement};
use arden_mlm::testing::TestContext;
use arden_mlm::{ArdenValue, MlmEngine, Result};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Module that concludes true and returns `values` after running `data`
pub fn returning(name: &str, data: Vec<Statement>, values: Vec<ExpressionNode>) -> MlmSource {
    MlmSource::new(name)
        .with_data(data)
        .with_logic(vec![Statement::conclude(ExpressionNode::boolean(true))])
        .with_action(vec![Statement::return_(values)])
}

/// Compile `source` with default settings and run it against `context`
pub fn run(source: &MlmSource, context: &TestContext) -> Result<Vec<ArdenValue>> {
    let engine = MlmEngine::new();
    let module = engine.compile(source)?;
    engine.run(&module, context, &[])
}
