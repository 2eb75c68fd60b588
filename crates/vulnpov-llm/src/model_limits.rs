/// Context window size, in tokens, for models this system knows about. Drives the
/// conversation's condensation threshold; an unknown model falls back to a conservative window
/// rather than failing the run.
const DEFAULT_CONTEXT_WINDOW: usize = 200_000;

pub fn context_window_for(model: &str) -> usize {
    match model {
        "claude-3-7-sonnet" | "claude37" => 200_000,
        "claude-3-5-haiku" => 200_000,
        "gpt-4o" => 128_000,
        _ => DEFAULT_CONTEXT_WINDOW,
    }
}
