//! Client-side check that a question is about waste or the environment.

/// Keywords that mark a message as on-topic (matched case-insensitively as substrings).
const TOPIC_KEYWORDS: &[&str] = &[
    "sampah",
    "limbah",
    "daur ulang",
    "recycle",
    "recycling",
    "bank sampah",
    "kompos",
    "organik",
    "anorganik",
    "plastik",
    "kertas",
    "kaca",
    "logam",
    "b3",
    "berbahaya",
    "lingkungan",
    "polusi",
    "pencemaran",
    "kebersihan",
    "bersih",
    "tpa",
    "tempat pembuangan",
    "reduce",
    "reuse",
    "3r",
    "insinerasi",
    "rdf",
    "refuse",
    "pengelolaan",
    "kelola",
    "timbulan",
    "emisi",
    "udara",
    "air",
    "tanah",
    "laut",
    "sungai",
    "citarum",
    "sarimukti",
    "jabar",
    "jawa barat",
    "bandung",
    "ramah lingkungan",
    "eco",
    "sustainability",
    "berkelanjutan",
    "hijau",
    "green",
    "pupuk",
    "komposting",
    "gaslah",
    "pemilah",
    "pilah",
    "volume sampah",
    "data sampah",
    "statistik",
    // greetings and courtesy are always welcome
    "halo",
    "hai",
    "selamat",
    "terima kasih",
    "makasih",
    "tolong",
    "bantu",
];

/// Whether `message` mentions any waste, environment, or courtesy keyword.
///
/// The check is advisory: off-topic questions are still forwarded and the
/// system prompt makes the model decline them.
#[must_use]
pub fn is_topic_related(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waste_questions_are_on_topic() {
        assert!(is_topic_related("Bagaimana cara membuat KOMPOS di rumah?"));
        assert!(is_topic_related("Berapa timbulan sampah di Jawa Barat?"));
        assert!(is_topic_related("Halo!"));
    }

    #[test]
    fn unrelated_questions_are_off_topic() {
        assert!(!is_topic_related("Siapa juara piala dunia 2018?"));
        assert!(!is_topic_related(""));
    }
}
