//! Built-in sample texts, one per supported demo language.
//!
//! Used when no text is supplied on the command line. Tags are sorted for
//! binary search.

/// (language tag, label, sample text), sorted by tag.
const SAMPLES: &[(&str, &str, &str)] = &[
    (
        "en-IN",
        "English",
        "India is building a sustainable future with clean energy. Solar and wind power help citizens and industries grow responsibly. The government supports renewable energy initiatives.",
    ),
    (
        "gu-IN",
        "Gujarati",
        "ભારત સ્વચ્છ ઊર્જાથી ઉજ્જવળ ભવિષ્ય બનાવી રહ્યું છે। સૌર અને પવન ઊર્જા નાગરિકોને સશક્ત બનાવે છે।",
    ),
    (
        "hi-IN",
        "Hindi",
        "भारत स्वच्छ ऊर्जा से उज्जवल भविष्य बना रहा है। सौर और पवन ऊर्जा नागरिकों को सशक्त बनाती है। सरकार अक्षय ऊर्जा का समर्थन करती है।",
    ),
    (
        "mr-IN",
        "Marathi",
        "भारत स्वच्छ ऊर्जेने उज्ज्वल भविष्य घडवत आहे। सौर आणि पवन ऊर्जा नागरिकांना सक्षम करते। सरकार अक्षय ऊर्जेला पाठिंबा देते।",
    ),
    (
        "ta-IN",
        "Tamil",
        "இந்தியா தூய்மையான ஆற்றலுடன் ஒளிமயமான எதிர்காலத்தை உருவாக்குகிறது। சூரிய மற்றும் காற்று ஆற்றல் குடிமக்களுக்கு உதவுகிறது।",
    ),
    (
        "te-IN",
        "Telugu",
        "భారతదేశం శుభ్రమైన శక్తితో ప్రకాశవంతమైన భవిష్యత్తును నిర్మిస్తోంది। సౌర మరియు పవన శక్తి పౌరులకు సహాయపడుతుంది।",
    ),
];

/// Get the sample text for a language tag.
pub fn sample_for(language: &str) -> Option<&'static str> {
    SAMPLES.binary_search_by_key(&language, |(tag, _, _)| tag).ok().map(|idx| SAMPLES[idx].2)
}

/// Print the demo languages with built-in sample texts.
pub fn print_languages() {
    println!("Languages with built-in sample text:");
    println!("{}", "─".repeat(40));
    for (tag, label, _) in SAMPLES {
        println!("{:<8} {}", tag, label);
    }
    println!();
    println!("Usage:");
    println!("  ./readalong --language hi-IN");
    println!("  ./readalong --language en-IN \"Any text you like\"");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_sorted_for_binary_search() {
        let mut tags: Vec<&str> = SAMPLES.iter().map(|(tag, _, _)| *tag).collect();
        let sorted = tags.clone();
        tags.sort_unstable();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn test_lookup() {
        assert!(sample_for("en-IN").unwrap().starts_with("India is building"));
        assert!(sample_for("ta-IN").is_some());
        assert!(sample_for("fr-FR").is_none());
    }
}
