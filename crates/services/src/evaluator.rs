use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use quiz_core::Language;
use quiz_core::model::StandardQuestion;

use crate::error::EvaluationError;

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

/// Outcome of comparing a selected option against the correct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    /// Explanation shown with the verdict; never empty when the bank carries
    /// a rationale for the correct answer.
    pub rationale: String,
    pub selected_index: usize,
    pub selected_text: String,
    pub correct_index: usize,
    pub correct_text: String,
}

/// Evaluates a selected option against a standard question.
///
/// Correctness is decided by index. The rationale comes from the positional
/// pairing when the bank data is aligned; otherwise [`recover_rationale`]
/// patches over the misalignment, and the correct answer's rationale is the
/// last resort. Rationale selection never fails and never blocks submission.
///
/// # Errors
///
/// Returns `EvaluationError::OptionOutOfRange` when `selected_index` does not
/// address an option in the resolved language.
pub fn evaluate(
    question: &StandardQuestion,
    lang: Language,
    selected_index: usize,
) -> Result<Evaluation, EvaluationError> {
    let options = question.options().resolve(lang);
    let rationales = question.rationales().resolve(lang);

    let Some(selected_text) = options.get(selected_index) else {
        return Err(EvaluationError::OptionOutOfRange {
            index: selected_index,
            len: options.len(),
        });
    };

    let correct_index = question.correct_index();
    let correct_text = options.get(correct_index).cloned().unwrap_or_default();
    let correct_rationale = rationales.get(correct_index).cloned().unwrap_or_default();

    let is_correct = selected_index == correct_index;
    let rationale = if is_correct {
        correct_rationale
    } else if aligned(options, rationales, selected_index) {
        rationales[selected_index].clone()
    } else {
        recover_rationale(selected_text, rationales).unwrap_or(correct_rationale)
    };

    Ok(Evaluation {
        is_correct,
        rationale,
        selected_index,
        selected_text: selected_text.clone(),
        correct_index,
        correct_text,
    })
}

/// The positional pairing is trusted only when both arrays line up and the
/// paired rationale actually says something.
fn aligned(options: &[String], rationales: &[String], index: usize) -> bool {
    rationales.len() == options.len()
        && rationales
            .get(index)
            .is_some_and(|r| !r.trim().is_empty())
}

/// Best-effort match of an option against a misaligned rationale list.
///
/// Both sides are normalized (casefold, diacritics stripped, whitespace
/// collapsed); a rationale matches when it contains the option text or opens
/// with the same first two words. Returns `None` when nothing matches, so the
/// caller can fall back to the correct answer's rationale.
///
/// This exists purely to mask known data-quality defects in the bank; it must
/// stay non-failing.
#[must_use]
pub fn recover_rationale(option_text: &str, rationales: &[String]) -> Option<String> {
    let needle = normalize(option_text);
    if needle.is_empty() {
        return None;
    }
    let needle_head = first_words(&needle, 2);

    for rationale in rationales {
        let haystack = normalize(rationale);
        if haystack.is_empty() {
            continue;
        }
        if haystack.contains(&needle) || first_words(&haystack, 2) == needle_head {
            return Some(rationale.clone());
        }
    }
    None
}

fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::lang::{LocalizedList, LocalizedText};

    fn question(options: Vec<&str>, rationales: Vec<&str>, correct: usize) -> StandardQuestion {
        StandardQuestion::new(
            LocalizedText::plain("prompt"),
            LocalizedList::plain(options.into_iter().map(String::from).collect()),
            LocalizedList::plain(rationales.into_iter().map(String::from).collect()),
            correct,
        )
        .unwrap()
    }

    #[test]
    fn correct_answer_yields_paired_rationale() {
        let q = question(vec!["A", "B", "C"], vec!["rA", "rB", "rC"], 1);
        let eval = evaluate(&q, Language::Pt, 1).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.rationale, "rB");
        assert_eq!(eval.correct_text, "B");
    }

    #[test]
    fn incorrect_answer_yields_its_own_rationale_when_aligned() {
        let q = question(vec!["A", "B", "C"], vec!["rA", "rB", "rC"], 1);
        let eval = evaluate(&q, Language::Pt, 0).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.rationale, "rA");
        assert_eq!(eval.selected_text, "A");
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let q = question(vec!["A", "B"], vec!["rA", "rB"], 0);
        let err = evaluate(&q, Language::Pt, 5).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::OptionOutOfRange { index: 5, len: 2 }
        ));
    }

    #[test]
    fn misaligned_rationales_recover_by_containment() {
        // Two options, three rationales: positional pairing is untrustworthy.
        let q = question(
            vec!["Usar senha forte", "Compartilhar a senha"],
            vec![
                "Errado: compartilhar a senha expõe a conta.",
                "Rationale sobre outra coisa.",
                "Certo: usar senha forte protege a conta.",
            ],
            0,
        );
        let eval = evaluate(&q, Language::Pt, 1).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.rationale, "Errado: compartilhar a senha expõe a conta.");
    }

    #[test]
    fn recovery_is_diacritic_and_case_insensitive() {
        let rationales = vec!["ERRADO: AVALIAÇÃO DE RISCO é obrigatória.".to_owned()];
        let matched = recover_rationale("avaliacao de risco", &rationales);
        assert_eq!(matched.as_deref(), rationales.first().map(String::as_str));
    }

    #[test]
    fn recovery_matches_on_first_two_words() {
        let rationales = vec!["Nunca clique no anexo sem verificar o remetente.".to_owned()];
        let matched = recover_rationale("Nunca clique em links desconhecidos", &rationales);
        assert!(matched.is_some());
    }

    #[test]
    fn recovery_falls_back_to_correct_rationale() {
        let q = question(
            vec!["Alpha", "Beta"],
            vec!["completely unrelated text"],
            0,
        );
        let eval = evaluate(&q, Language::Pt, 1).unwrap();
        assert!(!eval.is_correct);
        // No heuristic match for "Beta": fall back to the correct answer's rationale.
        assert_eq!(eval.rationale, "completely unrelated text");
    }

    #[test]
    fn blank_paired_rationale_triggers_recovery() {
        let q = question(
            vec!["Alpha risco", "Beta ataque"],
            vec!["rationale do alpha risco", "   "],
            0,
        );
        let eval = evaluate(&q, Language::Pt, 1).unwrap();
        // The paired slot is blank; no rationale mentions "beta ataque", so the
        // correct answer's rationale wins.
        assert_eq!(eval.rationale, "rationale do alpha risco");
    }
}
