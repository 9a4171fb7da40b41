use dbt_common::pyformat::format_kwargs;
use dbt_common::{ErrorCode, FsResult, fs_err};
use dbt_schemas::schemas::SourceDefinition;

/// Works out what a source should render as when it lives in a file rather than a table.
///
/// The table's own `meta.external_location` wins and is used as is. Otherwise the group's
/// `meta.external_location` is expanded as a template with `{name}` and `{identifier}`.
/// Returns `None` when neither is set or the result is empty.
pub fn resolve_external_location(source: &SourceDefinition) -> FsResult<Option<String>> {
    let location = if let Some(location) = source.meta_external_location()? {
        location.to_string()
    } else if let Some(template) = source.source_meta_external_location()? {
        format_kwargs(
            template,
            &[
                ("name", source.name.as_str()),
                ("identifier", source.identifier.as_str()),
            ],
        )
        .map_err(|e| {
            fs_err!(
                ErrorCode::FmtError,
                "Invalid external_location for source '{}.{}': {}",
                source.source_name,
                source.name,
                e.message()
            )
        })?
    } else {
        return Ok(None);
    };

    if location.is_empty() {
        return Ok(None);
    }
    Ok(Some(quote_external_location(location)))
}

/// Bare paths become SQL string literals. Function calls and values that already start
/// with a single quote are left alone.
pub fn quote_external_location(location: String) -> String {
    if location.contains('(') || location.starts_with('\'') {
        location
    } else {
        format!("'{location}'")
    }
}
