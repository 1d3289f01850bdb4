//! Per-language letter popularity, most frequent first.
//!
//! Names ending in `—` are alternate rankings of the same language (a different corpus, or
//! a different script for Japanese). They are folded into the base name after scoring.

use std::sync::LazyLock;

use super::script::{Script, is_accentuated};

/// A language's reference ranking and the features derived from it.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    pub name: &'static str,
    pub characters: Vec<char>,
    /// The alphabet uses accented Latin letters.
    pub have_accents: bool,
    /// Every letter is Latin.
    pub pure_latin: bool,
    /// Script of the most frequent letter.
    pub script: Script,
}

const FREQUENCIES: &[(&str, &str)] = &[
    ("English", "eationsrhldcumfpgwybvkxjqz"),
    ("English—", "eationsrhldcumfpgwybvkjxqz"),
    ("German", "enirstadhulgocmbfkwzpvüäöj"),
    ("French", "easnitrluodcpmévgfbhqàxèyj"),
    ("Dutch", "enairtodslghvmukcpbwjzfyxë"),
    ("Italian", "eiaonltrscdupmgvfbzhqèàkyò"),
    ("Polish", "aioenrzwsctkydpmuljłgbhąęó"),
    ("Spanish", "eaonsrildtcumpbgvfyóhqíjzá"),
    ("Russian", "оаеинстрвлкмдпугяызбйьчхжц"),
    (
        "Japanese",
        "人一大亅丁丨竹笑口日今二彳行十土丶寸寺時乙丿乂气気冂巾亠市目儿見八小凵県月彐門間木東山出本中刀分耳又取最言田心思刂前京尹事生厶云会未来白冫楽灬馬尸尺駅明耂者了阝都高卜占厂广店子申奄亻俺上方冖学衣艮食自",
    ),
    (
        "Japanese—",
        "ーンス・ルトリイアラックドシレジタフロカテマィグバムプオコデニウメサビナブャエュチキズダパミェョハセベガモツネボソノァヴワポペピケゴギザホゲォヤヒユヨヘゼヌゥゾヶヂヲヅヵヱヰヮヽ゠ヾヷヿヸヹヺ",
    ),
    (
        "Japanese——",
        "のにるたとはしいをでてがなれからさっりすあもこまうくよきんめおけそつだやえどわちみせじばへびずろほげむべひょゆぶごゃねふぐぎぼゅづざぞぬぜぱぽぷぴぃぁぇぺゞぢぉぅゐゝゑゎゔゟゕゖ",
    ),
    ("Portuguese", "aeosirdntmuclpgvbfhãqéçázj"),
    ("Swedish", "eanrtsildomkgvhfupäcböåyjx"),
    (
        "Chinese",
        "的一是不了在人有我他这个们中来上大为和国地到以说时要就出会可也你对生能而子那得于着下自之年过发后作里用道行所然家种事成方多经么去法学如都同现当没动面起看定天分还进好小部其些主样理心她本前开但因只从想实",
    ),
    ("Ukrainian", "оаніирвтесклудмпзяьбгйчхцї"),
    ("Norwegian", "erntasioldgkmvfpubhåyjøcæw"),
    ("Finnish", "aintesloukämrvjhpydögcbfwz"),
    ("Vietnamese", "nhticgaoumlràđsevpbyưdákộế"),
    ("Czech", "oeantsilvrkdumpíchzáyjběéř"),
    ("Hungarian", "eatlsnkriozáégmbyvdhuópjöf"),
    ("Korean", "이다에의는로하을가고지서한은기으년대사시를리도인스일"),
    ("Indonesian", "aneirtusdkmlgpbohyjcwfvzxq"),
    ("Turkish", "aeinrlıkdtsmyuobüşvgzhcpçğ"),
    ("Romanian", "eiarntulocsdpmăfvîgbșțzhâj"),
    ("Farsi", "ایردنهومتبسلکشزفگعخقجآپحطص"),
    ("Arabic", "اليمونرتبةعدسفهكقأحجشطصىخإ"),
    ("Danish", "erntaisdlogmkfvubhpåyøæcjw"),
    ("Serbian", "аиоенрсуткјвдмплгзбцшчњжћ"),
    ("Lithuanian", "iasoretnukmlpvdjgėbyųšžcąį"),
    ("Slovene", "eaionrsltjvkdpmuzbghčcšžfy"),
    ("Slovak", "oaenirvtslkdmpuchjbzáyýíčé"),
    ("Hebrew", "יוהלרבתמאשנעםדקחפסכגטצןזך"),
    ("Bulgarian", "аиоентрсвлкдпмзгяъубчцйжщх"),
    ("Croatian", "aioenrjstuklvdmpgzbcčhšžćf"),
    ("Estonian", "aiestlunokrdmvgpjhäbõüfcöy"),
    ("Thai", "านรอกเงมยลวดทสตะปบคหแจพชขใ"),
    ("Greek", "ατοιενρσκηπςυμλίόάγέδήωχθύ"),
];

static PROFILES: LazyLock<Vec<LanguageProfile>> = LazyLock::new(|| {
    FREQUENCIES
        .iter()
        .map(|&(name, ranking)| {
            let characters: Vec<char> = ranking.chars().collect();
            let script = characters.first().map_or(Script::Other, |&c| Script::of(c));
            LanguageProfile {
                name,
                have_accents: characters.iter().any(|&c| is_accentuated(c)),
                pure_latin: characters.iter().all(|&c| Script::of(c) == Script::Latin),
                characters,
                script,
            }
        })
        .collect()
});

/// All language profiles.
pub fn profiles() -> &'static [LanguageProfile] {
    &PROFILES
}

/// Look up a language profile by exact name.
pub fn profile(name: &str) -> Option<&'static LanguageProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// Profiles for `language` and its `—` variants.
pub fn variants(language: &str) -> impl Iterator<Item = &'static LanguageProfile> + '_ {
    PROFILES
        .iter()
        .filter(move |p| p.name.trim_end_matches('—') == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(language: &str) -> Option<(bool, bool)> {
        profile(language).map(|p| (p.have_accents, p.pure_latin))
    }

    #[test]
    fn test_language_features() {
        assert_eq!(features("English"), Some((false, true)));
        assert_eq!(features("French"), Some((true, true)));
        assert_eq!(features("Hebrew"), Some((false, false)));
        assert_eq!(features("Arabic"), Some((false, false)));
        assert_eq!(features("Vietnamese"), Some((true, true)));
        assert_eq!(features("Turkish"), Some((true, true)));
        assert_eq!(features("Klingon"), None);
    }

    #[test]
    fn test_rankings_have_no_duplicates() {
        for p in profiles() {
            let mut seen = p.characters.clone();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), p.characters.len(), "{} repeats a letter", p.name);
        }
    }

    #[test]
    fn test_variants() {
        let names: Vec<_> = variants("Japanese").map(|p| p.name).collect();
        assert_eq!(names, vec!["Japanese", "Japanese—", "Japanese——"]);
        assert_eq!(profile("Japanese——").unwrap().script, Script::Hiragana);
        assert_eq!(profile("Russian").unwrap().script, Script::Cyrillic);
    }
}
