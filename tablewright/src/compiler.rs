use std::sync::Arc;

use log::debug;

use crate::{dialect::DialectGenerator, error::Result, model::TableModel};

/// Turns declared tables into DDL with one dialect.
///
/// Output order is table declaration order, one statement per table, so the
/// statements can run in sequence inside a single transaction.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    generator: Arc<dyn DialectGenerator>,
}

impl SchemaCompiler {
    pub fn new(generator: Arc<dyn DialectGenerator>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &Arc<dyn DialectGenerator> {
        &self.generator
    }

    /// Compiles every table, stopping at the first generator error.
    pub fn compile(&self, tables: &[TableModel]) -> Result<Vec<String>> {
        tables
            .iter()
            .map(|table| {
                let statement = self.generator.generate(table)?;
                debug!("[{}] {}", self.generator.name(), statement);
                Ok(statement)
            })
            .collect()
    }
}
