use crate::session::QueryResult;

/// Human-readable dump of a result set: a `rows` section and a `fields`
/// section separated by an HTML line break pair.
pub fn render_dump(result: &QueryResult) -> Result<String, serde_json::Error> {
    let rows = serde_json::to_string(&result.rows)?;
    let fields = serde_json::to_string(&result.fields)?;
    Ok(format!("rows : {}<br><br>fields : {}", rows, fields))
}
