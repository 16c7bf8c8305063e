//! Voice selection policy.
//!
//! Given a language tag and a catalog snapshot, picks the voice most likely
//! to deliver usable word-boundary events. Pure function; the caller refreshes
//! the catalog when the backend reports it changed.

use tracing::debug;

use super::catalog::{Voice, VoiceCatalog, primary_subtag};

/// Tunable knobs for voice selection.
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Case-insensitive substring preferred in voice names when no local
    /// voice matches (vendor voices tend to have dependable boundary events).
    pub preferred_vendor: String,
    /// Regional tags tried, in order, when the requested English region has
    /// no voice of its own.
    pub english_fallback_regions: Vec<String>,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            preferred_vendor: "microsoft".to_string(),
            english_fallback_regions: vec!["en-US".to_string(), "en-GB".to_string(), "en-AU".to_string(), "en-IN".to_string()],
        }
    }
}

/// Select the best available voice for `language`, or `None` if the catalog
/// has no voice sharing even the primary subtag.
///
/// Candidates are ordered: exact tag matches, then (for English) configured
/// regional fallbacks in list order, then any remaining primary-subtag match
/// in catalog order. Over that ordering the priority is:
/// 1. a locally installed voice,
/// 2. a voice whose name contains the preferred vendor substring,
/// 3. the first candidate.
pub fn resolve(language: &str, catalog: &VoiceCatalog, policy: &ResolverPolicy) -> Option<Voice> {
    let candidates = ordered_candidates(language, catalog, policy);
    if candidates.is_empty() {
        debug!("No voice found for {}", language);
        return None;
    }

    debug!("Found {} voice(s) for {}", candidates.len(), language);

    if let Some(voice) = candidates.iter().find(|v| v.local) {
        debug!("Using local voice: {}", voice.name);
        return Some((*voice).clone());
    }

    let vendor = policy.preferred_vendor.to_lowercase();
    if !vendor.is_empty()
        && let Some(voice) = candidates.iter().find(|v| v.name.to_lowercase().contains(&vendor))
    {
        debug!("Using {} voice: {}", policy.preferred_vendor, voice.name);
        return Some((*voice).clone());
    }

    debug!("Using voice: {}", candidates[0].name);
    Some(candidates[0].clone())
}

/// All voices sharing the primary subtag, ordered by match quality.
fn ordered_candidates<'a>(language: &str, catalog: &'a VoiceCatalog, policy: &ResolverPolicy) -> Vec<&'a Voice> {
    let primary = primary_subtag(language);
    let matching: Vec<&Voice> = catalog.voices().iter().filter(|v| v.primary_subtag() == primary).collect();

    let mut ordered: Vec<&Voice> = matching.iter().copied().filter(|v| v.language == language).collect();

    if primary == "en" {
        for region in &policy.english_fallback_regions {
            for voice in matching.iter().copied() {
                if voice.language == *region && !ordered.iter().any(|v| std::ptr::eq(*v, voice)) {
                    ordered.push(voice);
                }
            }
        }
    }

    for voice in matching {
        if !ordered.iter().any(|v| std::ptr::eq(*v, voice)) {
            ordered.push(voice);
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(voices: Vec<Voice>) -> VoiceCatalog {
        VoiceCatalog::loaded(voices, &VoiceCatalog::pending())
    }

    #[test]
    fn test_prefers_local_voice() {
        let catalog = catalog(vec![Voice::new("Cloud Voice", "en-IN", false), Voice::new("OS Voice", "en-IN", true)]);
        let voice = resolve("en-IN", &catalog, &ResolverPolicy::default()).unwrap();
        assert_eq!(voice.name, "OS Voice");
    }

    #[test]
    fn test_prefers_vendor_when_no_local() {
        let catalog = catalog(vec![Voice::new("Browser Voice", "en-IN", false), Voice::new("Microsoft Heera", "en-IN", false)]);
        let voice = resolve("en-IN", &catalog, &ResolverPolicy::default()).unwrap();
        assert_eq!(voice.name, "Microsoft Heera");
    }

    #[test]
    fn test_falls_back_to_first_match() {
        let catalog = catalog(vec![Voice::new("Voice A", "hi-IN", false), Voice::new("Voice B", "hi-IN", false)]);
        let voice = resolve("hi-IN", &catalog, &ResolverPolicy::default()).unwrap();
        assert_eq!(voice.name, "Voice A");
    }

    #[test]
    fn test_none_when_no_match() {
        let catalog = catalog(vec![Voice::new("Voice A", "fr-FR", true)]);
        assert!(resolve("ta-IN", &catalog, &ResolverPolicy::default()).is_none());
    }

    #[test]
    fn test_english_regional_fallback() {
        // No en-IN voice, but en-GB is in the configured fallback list.
        let catalog = catalog(vec![Voice::new("Daniel", "en-GB", false)]);
        let voice = resolve("en-IN", &catalog, &ResolverPolicy::default()).unwrap();
        assert_eq!(voice.language, "en-GB");
    }

    #[test]
    fn test_exact_match_beats_fallback_region() {
        let catalog = catalog(vec![Voice::new("Samantha", "en-US", false), Voice::new("Heera", "en-IN", false)]);
        let voice = resolve("en-IN", &catalog, &ResolverPolicy::default()).unwrap();
        assert_eq!(voice.name, "Heera");
    }

    #[test]
    fn test_fallback_region_order_applies() {
        let policy = ResolverPolicy { preferred_vendor: String::new(), ..ResolverPolicy::default() };
        let catalog = catalog(vec![Voice::new("Karen", "en-AU", false), Voice::new("Samantha", "en-US", false)]);
        // en-US precedes en-AU in the default fallback list.
        let voice = resolve("en-IN", &catalog, &policy).unwrap();
        assert_eq!(voice.language, "en-US");
    }

    #[test]
    fn test_primary_subtag_only_voice_matches() {
        let catalog = catalog(vec![Voice::new("Plain English", "en", false)]);
        assert!(resolve("en-IN", &catalog, &ResolverPolicy::default()).is_some());
    }
}
