//! Statement and request builders

use provql_ir::CompileRequest;

/// INSERT with the given `column = literal` pairs and full provenance
pub fn insert_source(assignments: &[(&str, &str)], actor: &str, rationale: &str) -> String {
    let set: Vec<String> = assignments
        .iter()
        .map(|(column, literal)| format!("{} = {}", column, literal))
        .collect();
    format!(
        "INSERT INTO evidence SET {} ACTOR {:?} RATIONALE {:?}",
        set.join(", "),
        actor,
        rationale
    )
}

/// Request whose missing provenance is filled from request-level defaults
pub fn request_with_defaults(source: impl Into<String>, role: &str) -> CompileRequest {
    CompileRequest::new(source, role)
        .with_actor("test-runner")
        .with_rationale("integration test")
}

/// `n` single-row inserts with distinct titles and scores
pub fn insert_batch(n: usize, role: &str) -> Vec<CompileRequest> {
    (0..n)
        .map(|i| {
            let title = format!("\"doc {}\"", i);
            let score = i.to_string();
            request_with_defaults(
                insert_source(&[("title", &title), ("score", &score)], "batch", "load"),
                role,
            )
        })
        .collect()
}
