//! Query-string encoding of the core query model in PostgREST syntax.

use serde_json::Value;
use chester_core::query::{Condition, Filter, Query};

/// `column=op.value` pairs for a filter, one per condition.
pub(crate) fn encode_filter(filter: &Filter) -> Vec<(String, String)> {
    filter
        .conditions()
        .iter()
        .map(|c| match c {
            Condition::Eq(column, value) => (column.clone(), format!("eq.{}", literal(value))),
            Condition::IsBlank(column) => (
                "or".to_string(),
                format!("({c}.is.null,{c}.eq.)", c = column),
            ),
            Condition::In(column, values) => {
                let list: Vec<String> = values.iter().map(quoted).collect();
                (column.clone(), format!("in.({})", list.join(",")))
            }
        })
        .collect()
}

/// Full parameter list for a select: projection, filters, ordering, limit.
pub(crate) fn encode_query(query: &Query) -> Vec<(String, String)> {
    let select = match &query.columns {
        Some(columns) if !columns.is_empty() => columns.join(","),
        _ => "*".to_string(),
    };
    let mut params = vec![("select".to_string(), select)];
    params.extend(encode_filter(&query.filter));

    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect();
        params.push(("order".to_string(), order.join(",")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// List members containing reserved characters must be double-quoted.
fn quoted(value: &Value) -> String {
    let raw = literal(value);
    if raw.contains(|c: char| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' ')) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}
