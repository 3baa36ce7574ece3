//! Known Gemini models and their free-tier request ceilings

/// Models accepted by the Gemini provider
pub const GEMINI_MODELS: [&str; 5] = [
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-2.0-flash",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
];

/// Default downgrade order, strongest tier first
pub const DEFAULT_CASCADE: [&str; 3] = ["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.0-flash"];

/// Free-tier requests per minute for a Gemini model
pub fn free_tier_rpm(model: &str) -> Option<u32> {
    match model {
        "gemini-1.5-flash" => Some(15),
        "gemini-1.5-pro" => Some(10),
        "gemini-2.0-flash" => Some(10),
        "gemini-2.5-flash" => Some(10),
        "gemini-2.5-pro" => Some(5),
        _ => None,
    }
}

/// Whether `model` is a supported Gemini model
pub fn is_supported_gemini(model: &str) -> bool {
    GEMINI_MODELS.contains(&model)
}

/// Requested rate capped by the model's free-tier ceiling
///
/// Models without a known ceiling keep the requested rate.
pub fn effective_rpm(model: &str, requested: u32) -> u32 {
    match free_tier_rpm(model) {
        Some(ceiling) => requested.min(ceiling),
        None => requested,
    }
}
