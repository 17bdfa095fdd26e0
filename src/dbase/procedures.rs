use std::collections::BTreeMap;

use mysql::Value;

use crate::dbase::{value_to_i64, value_to_string};
use crate::errors::{normalize_sql_error, ApiError, ApiErrorKind};

/// Reserved output parameter carrying the procedure's error code (0 = success).
pub const OUT_ERR_CODE: &str = "p_err_code";
/// Reserved output parameter carrying the procedure's error message.
pub const OUT_ERR_MSG: &str = "p_err_msg";

/// One row of a result set, column values in select order.
pub type RowValues = Vec<Value>;

/// Narrow seam over one database session.
///
/// The invoker only needs "run a statement, walk its result sets"; everything
/// driver-specific (placeholder syntax aside) stays behind this trait, so the
/// session-variable scheme used for output parameters remains an internal
/// detail of the MySQL adapter and tests can script a session of their own.
pub trait SqlSession {
    fn execute<'a>(
        &'a mut self,
        stmt: &str,
        params: Vec<Value>,
    ) -> Result<Box<dyn ResultSets + 'a>, String>;
}

/// The result sets produced by one statement, walked in order.
pub trait ResultSets {
    /// Advance to the next result set and return its fully read rows;
    /// `None` once every set has been consumed.
    fn next_set(&mut self) -> Option<Result<Vec<RowValues>, String>>;
}

/// Raw outcome of one stored-procedure call, before error normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureOutcome {
    pub ok: bool,
    /// Output parameters by name; empty unless the call succeeded.
    pub outputs: BTreeMap<String, Value>,
    pub err_code: i32,
    pub err_msg: String,
    /// Set when the driver itself failed, as opposed to the procedure
    /// deliberately reporting a business rejection.
    pub driver_error: bool,
}

impl ProcedureOutcome {
    fn success(outputs: BTreeMap<String, Value>) -> Self {
        ProcedureOutcome {
            ok: true,
            outputs,
            err_code: 0,
            err_msg: String::new(),
            driver_error: false,
        }
    }
    fn rejected(err_code: i32, err_msg: String) -> Self {
        ProcedureOutcome {
            ok: false,
            outputs: BTreeMap::new(),
            err_code,
            err_msg,
            driver_error: false,
        }
    }
    fn failed(err_msg: String) -> Self {
        ProcedureOutcome {
            ok: false,
            outputs: BTreeMap::new(),
            err_code: 500,
            err_msg,
            driver_error: true,
        }
    }

    /// Resolve the outcome into the output mapping or a unified error.
    ///
    /// Business rejections go through the error normalizer; driver failures
    /// keep their diagnostic text under the sql-exception kind.
    pub fn into_result(self) -> Result<BTreeMap<String, Value>, ApiError> {
        if self.ok {
            return Ok(self.outputs);
        }
        if self.driver_error {
            return Err(ApiError::with_message(ApiErrorKind::SqlException, &self.err_msg));
        }
        Err(normalize_sql_error(self.err_code, &self.err_msg).into())
    }
}

/// Call a stored procedure with positional inputs and named output parameters.
///
/// The statement issued is `CALL name(?, ..., @_name_i, ...)` with one session
/// variable per declared output, indexed after the inputs. Every incidental
/// result set the call produces is drained before the outputs are read back
/// with a follow-up `SELECT`, so the connection stays usable afterwards.
///
/// The reserved `p_err_code` / `p_err_msg` outputs are extracted into the
/// outcome's error channel and, on success, removed from the output mapping.
/// This function never panics and reports driver failures inside the outcome.
pub fn call_procedure<S: SqlSession + ?Sized>(
    session: &mut S,
    name: &str,
    in_params: Vec<Value>,
    out_names: &[&str],
) -> ProcedureOutcome {
    match try_call_procedure(session, name, in_params, out_names) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("procedure {}: {}", name, &e);
            ProcedureOutcome::failed(format!("database call failed: {}", e))
        }
    }
}

fn try_call_procedure<S: SqlSession + ?Sized>(
    session: &mut S,
    name: &str,
    in_params: Vec<Value>,
    out_names: &[&str],
) -> Result<ProcedureOutcome, String> {
    let start_index = in_params.len();

    let mut placeholders: Vec<String> = vec!["?".to_string(); in_params.len()];
    for offset in 0..out_names.len() {
        placeholders.push(out_symbol(name, start_index + offset));
    }
    let call_stmt = format!("CALL {}({})", name, placeholders.join(", "));

    {
        let mut results = session.execute(&call_stmt, in_params)?;
        // Unread result sets would leave the connection out of sync for the
        // next statement.
        while let Some(set) = results.next_set() {
            set?;
        }
    }

    let mut outputs: BTreeMap<String, Value> = BTreeMap::new();
    if !out_names.is_empty() {
        let select_items: Vec<String> = out_names
            .iter()
            .enumerate()
            .map(|(offset, out_name)| {
                format!("{} AS {}", out_symbol(name, start_index + offset), out_name)
            })
            .collect();
        let select_stmt = format!("SELECT {}", select_items.join(", "));

        let mut results = session.execute(&select_stmt, Vec::new())?;
        let mut first_row: Option<RowValues> = None;
        while let Some(set) = results.next_set() {
            let rows = set?;
            if first_row.is_none() {
                first_row = rows.into_iter().next();
            }
        }
        if let Some(row) = first_row {
            for (offset, out_name) in out_names.iter().enumerate() {
                let value = row.get(offset).cloned().unwrap_or(Value::NULL);
                outputs.insert((*out_name).to_string(), value);
            }
        }
    }

    let err_code = outputs
        .get(OUT_ERR_CODE)
        .and_then(value_to_i64)
        .unwrap_or(0) as i32;
    let err_msg = outputs
        .get(OUT_ERR_MSG)
        .and_then(value_to_string)
        .unwrap_or_default();

    if err_code == 0 {
        outputs.remove(OUT_ERR_CODE);
        outputs.remove(OUT_ERR_MSG);
        Ok(ProcedureOutcome::success(outputs))
    } else {
        Ok(ProcedureOutcome::rejected(err_code, err_msg))
    }
}

/// Session symbol holding one output parameter of the current call.
fn out_symbol(name: &str, index: usize) -> String {
    format!("@_{}_{}", name, index)
}

#[cfg(not(feature = "mockdata"))]
pub mod impls {
    use mysql::prelude::Queryable;
    use mysql::{Binary, QueryResult, Value};

    use super::{ResultSets, RowValues, SqlSession};
    use crate::dbase;

    /// Adapter binding the invoker to one pooled MySQL connection.
    pub struct MySqlSession<'c> {
        conn: &'c mut dbase::Connection,
    }

    impl<'c> MySqlSession<'c> {
        pub fn new(conn: &'c mut dbase::Connection) -> Self {
            MySqlSession { conn }
        }
    }

    impl SqlSession for MySqlSession<'_> {
        fn execute<'a>(
            &'a mut self,
            stmt: &str,
            params: Vec<Value>,
        ) -> Result<Box<dyn ResultSets + 'a>, String> {
            let result = self
                .conn
                .exec_iter(stmt, dbase::to_params(params))
                .map_err(|e| e.to_string())?;
            Ok(Box::new(MySqlResultSets { result }))
        }
    }

    struct MySqlResultSets<'c, 't, 'tc> {
        result: QueryResult<'c, 't, 'tc, Binary>,
    }

    impl ResultSets for MySqlResultSets<'_, '_, '_> {
        fn next_set(&mut self) -> Option<Result<Vec<RowValues>, String>> {
            let set = self.result.iter()?;
            let mut rows: Vec<RowValues> = Vec::new();
            for row in set {
                match row {
                    Ok(row) => rows.push(row.unwrap()),
                    Err(e) => return Some(Err(e.to_string())),
                }
            }
            Some(Ok(rows))
        }
    }
}
