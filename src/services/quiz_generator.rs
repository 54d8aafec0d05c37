use rand::seq::SliceRandom;
use regex::Regex;

use crate::services::llm::LlmService;
use crate::utils::xp::Difficulty;

const MAX_EXPLANATION_CHARS: usize = 500;
const MIN_PARSEABLE_CHARS: usize = 20;

/// One generated quiz question with its shuffled options.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub category: String,
}

impl QuizQuestion {
    /// True for the sentinel question produced when generation failed twice.
    pub fn is_placeholder(&self) -> bool {
        self.category == "error"
    }
}

/// Turns a topic into a list of quiz questions through the LLM service.
pub struct QuizGenerator {
    llm: LlmService,
}

impl QuizGenerator {
    pub fn new(llm: LlmService) -> Self {
        QuizGenerator { llm }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    /// Generate questions for a topic. A provider failure is retried once
    /// with a simplified prompt; if that also fails, a single placeholder
    /// question is returned so callers never see an empty quiz.
    pub async fn generate(
        &self,
        topic: &str,
        count: u8,
        difficulty: Difficulty,
        category: &str,
    ) -> Vec<QuizQuestion> {
        let prompt = build_prompt(topic, count, difficulty, category);
        match self.llm.generate_text(&prompt).await {
            Ok(text) => {
                let questions = parse_tagged_questions(&text, difficulty, category);
                if !questions.is_empty() {
                    return truncate(questions, count);
                }
                tracing::warn!(
                    "[QUIZ] No parseable questions for '{}', retrying with fallback prompt",
                    topic
                );
            }
            Err(e) => {
                tracing::warn!("[QUIZ] Generation failed for '{}': {}, retrying", topic, e);
            }
        }

        let fallback = build_fallback_prompt(topic, count);
        match self.llm.generate_text(&fallback).await {
            Ok(text) => {
                let questions = parse_tagged_questions(&text, difficulty, category);
                if !questions.is_empty() {
                    return truncate(questions, count);
                }
            }
            Err(e) => {
                tracing::error!("[QUIZ] Fallback generation failed for '{}': {}", topic, e);
            }
        }

        vec![placeholder_question(topic, difficulty)]
    }
}

fn truncate(mut questions: Vec<QuizQuestion>, count: u8) -> Vec<QuizQuestion> {
    questions.truncate(count as usize);
    questions
}

fn build_prompt(topic: &str, count: u8, difficulty: Difficulty, category: &str) -> String {
    format!(
        "Generate {count} {difficulty} multiple-choice quiz questions about \"{topic}\" \
         (category: {category}).\n\n\
         Format every question exactly like this, with no extra text between blocks:\n\
         <QUESTION>The question text</QUESTION>\n\
         <OPTION_A>First option</OPTION_A>\n\
         <OPTION_B>Second option</OPTION_B>\n\
         <OPTION_C>Third option</OPTION_C>\n\
         <OPTION_D>Fourth option</OPTION_D>\n\
         <CORRECT>A</CORRECT>\n\
         <EXPLANATION>Why the answer is correct</EXPLANATION>\n\n\
         Rules:\n\
         - Each question must have exactly one correct option.\n\
         - Options must be plausible and distinct.\n\
         - The question text must not reveal the answer.\n\
         - Keep explanations under two sentences.",
        count = count,
        difficulty = difficulty.as_str(),
        topic = topic,
        category = category,
    )
}

/// Stripped-down retry prompt for providers that mangled the full format.
fn build_fallback_prompt(topic: &str, count: u8) -> String {
    format!(
        "Write {count} multiple-choice questions about {topic}. Use this exact format:\n\
         <QUESTION>text</QUESTION>\n\
         <OPTION_A>a</OPTION_A>\n\
         <OPTION_B>b</OPTION_B>\n\
         <OPTION_C>c</OPTION_C>\n\
         <OPTION_D>d</OPTION_D>\n\
         <CORRECT>A</CORRECT>",
    )
}

fn placeholder_question(topic: &str, difficulty: Difficulty) -> QuizQuestion {
    QuizQuestion {
        text: format!(
            "Question generation for \"{topic}\" failed. Which command retries the quiz?"
        ),
        options: vec![
            "/quiz start".to_string(),
            "/quiz stop".to_string(),
            "/stats".to_string(),
            "/leaderboard".to_string(),
        ],
        correct_answer: "/quiz start".to_string(),
        explanation: Some(
            "The quiz provider did not return usable questions. Try again in a moment."
                .to_string(),
        ),
        difficulty,
        category: "error".to_string(),
    }
}

/// Parse `<QUESTION>`-tagged blocks out of an LLM response. Malformed
/// blocks are skipped with a warning; the rest still parse.
pub fn parse_tagged_questions(
    response_text: &str,
    difficulty: Difficulty,
    category: &str,
) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();
    if response_text.len() < MIN_PARSEABLE_CHARS {
        tracing::warn!("[QUIZ] Response too short to parse");
        return questions;
    }

    let question_re = Regex::new(r"(?s)<QUESTION>(.*?)</QUESTION>").unwrap();
    let correct_re = Regex::new(r"(?s)<CORRECT>(.*?)</CORRECT>").unwrap();
    let explanation_re = Regex::new(r"(?s)<EXPLANATION>(.*?)</EXPLANATION>").unwrap();

    // Each block runs from one <QUESTION> tag to the next.
    let starts: Vec<usize> = response_text.match_indices("<QUESTION>").map(|(i, _)| i).collect();
    for (block_index, &start) in starts.iter().enumerate() {
        let end = starts
            .get(block_index + 1)
            .copied()
            .unwrap_or(response_text.len());
        let block = &response_text[start..end];

        let Some(text) = question_re
            .captures(block)
            .map(|c| c[1].trim().to_string())
        else {
            tracing::warn!("[QUIZ] Block {} has no question text", block_index + 1);
            continue;
        };

        let Some(correct_letter) = correct_re.captures(block).map(|c| c[1].trim().to_string())
        else {
            tracing::warn!("[QUIZ] Block {} has no correct marker", block_index + 1);
            continue;
        };

        let mut labeled = Vec::new();
        for letter in ["A", "B", "C", "D"] {
            let option_re =
                Regex::new(&format!(r"(?s)<OPTION_{letter}>(.*?)</OPTION_{letter}>")).unwrap();
            if let Some(caps) = option_re.captures(block) {
                labeled.push((letter, caps[1].trim().to_string()));
            }
        }

        let Some(correct_answer) = labeled
            .iter()
            .find(|(letter, _)| *letter == correct_letter)
            .map(|(_, text)| text.clone())
        else {
            tracing::warn!(
                "[QUIZ] Block {} marks '{}' correct but has no such option",
                block_index + 1,
                correct_letter
            );
            continue;
        };

        if labeled.len() < 2 {
            tracing::warn!("[QUIZ] Block {} has fewer than two options", block_index + 1);
            continue;
        }

        let explanation = explanation_re
            .captures(block)
            .map(|c| trim_explanation(c[1].trim()));

        questions.push(QuizQuestion {
            text,
            options: shuffled_options(&labeled, &correct_answer),
            correct_answer,
            explanation,
            difficulty,
            category: category.to_string(),
        });
    }

    questions
}

/// Shuffle the incorrect options and place the correct answer at a random
/// position, so option A is not always right.
fn shuffled_options(labeled: &[(&str, String)], correct_answer: &str) -> Vec<String> {
    let mut rng = rand::rng();

    let mut others: Vec<String> = labeled
        .iter()
        .map(|(_, text)| text.clone())
        .filter(|text| text != correct_answer)
        .collect();
    others.shuffle(&mut rng);

    let position = (rand::random::<u32>() as usize) % (others.len() + 1);
    others.insert(position.min(3), correct_answer.to_string());
    others.truncate(4);
    others
}

fn trim_explanation(explanation: &str) -> String {
    if explanation.chars().count() <= MAX_EXPLANATION_CHARS {
        return explanation.to_string();
    }
    let truncated: String = explanation.chars().take(MAX_EXPLANATION_CHARS - 3).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "\
<QUESTION>What is the chemical symbol for gold?</QUESTION>\n\
<OPTION_A>Au</OPTION_A>\n\
<OPTION_B>Ag</OPTION_B>\n\
<OPTION_C>Gd</OPTION_C>\n\
<OPTION_D>Go</OPTION_D>\n\
<CORRECT>A</CORRECT>\n\
<EXPLANATION>Gold's symbol comes from the Latin aurum.</EXPLANATION>\n\
<QUESTION>Which planet is known as the Red Planet?</QUESTION>\n\
<OPTION_A>Venus</OPTION_A>\n\
<OPTION_B>Mars</OPTION_B>\n\
<OPTION_C>Jupiter</OPTION_C>\n\
<OPTION_D>Saturn</OPTION_D>\n\
<CORRECT>B</CORRECT>\n";

    #[test]
    fn test_parse_two_questions() {
        let questions = parse_tagged_questions(RESPONSE, Difficulty::Medium, "science");
        assert_eq!(questions.len(), 2);

        assert_eq!(questions[0].correct_answer, "Au");
        assert_eq!(questions[0].options.len(), 4);
        assert!(questions[0].options.contains(&"Au".to_string()));
        assert_eq!(
            questions[0].explanation.as_deref(),
            Some("Gold's symbol comes from the Latin aurum.")
        );

        assert_eq!(questions[1].correct_answer, "Mars");
        assert!(questions[1].explanation.is_none());
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let response = format!(
            "<QUESTION>Broken, no options or marker</QUESTION>\n{RESPONSE}"
        );
        let questions = parse_tagged_questions(&response, Difficulty::Easy, "general");
        assert_eq!(questions.len(), 2);
    }

    #[test]
    fn test_correct_marker_without_matching_option() {
        let response = "\
<QUESTION>Pick one</QUESTION>\n\
<OPTION_A>first</OPTION_A>\n\
<OPTION_B>second</OPTION_B>\n\
<CORRECT>D</CORRECT>\n";
        assert!(parse_tagged_questions(response, Difficulty::Easy, "general").is_empty());
    }

    #[test]
    fn test_short_response_parses_to_nothing() {
        assert!(parse_tagged_questions("nope", Difficulty::Easy, "general").is_empty());
    }

    #[test]
    fn test_explanation_trimmed_to_limit() {
        let long = "x".repeat(600);
        let trimmed = trim_explanation(&long);
        assert_eq!(trimmed.chars().count(), MAX_EXPLANATION_CHARS);
        assert!(trimmed.ends_with("..."));
    }

    #[test]
    fn test_placeholder_flagged() {
        let question = placeholder_question("rust", Difficulty::Medium);
        assert!(question.is_placeholder());
        assert_eq!(question.options.len(), 4);
        assert!(question.options.contains(&question.correct_answer));
    }
}
