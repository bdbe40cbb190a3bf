//! crates/prog_helper_core/src/prompts.rs
//!
//! Language detection and system-prompt assembly for the completion provider,
//! plus the fixed question-category vocabulary used by the classifier.

/// The eight categories a question can be classified into.
pub const QUESTION_CATEGORIES: [&str; 8] = [
    "Code Debugging",
    "Algorithm Help",
    "Syntax Questions",
    "Framework Help",
    "Database Queries",
    "API Integration",
    "General Programming",
    "Code Review",
];

/// The category used when classification fails or returns something outside
/// the fixed vocabulary.
pub const DEFAULT_CATEGORY: &str = "General Programming";

/// The language bucket for messages with no recognizable language.
pub const GENERAL_LANGUAGE: &str = "general";

const PROGRAMMING_ONLY_RESTRICTION: &str = "\
CRITICAL: You are a programming assistant ONLY. Answer programming questions, \
debugging requests, algorithm and data-structure explanations, code review and \
language syntax. Politely decline anything unrelated to programming and ask \
the user for a programming question instead.";

const GENERAL_PROMPT: &str = "\
You are a helpful programming assistant. Provide clear, concise, and accurate \
answers to programming questions. When providing code examples, make sure they \
are well-formatted and include comments where appropriate.";

struct LanguageProfile {
    language: &'static str,
    prompt: &'static str,
    keywords: &'static [&'static str],
}

// Framework names map to a language before the per-language keywords run,
// so "react hooks" lands on javascript rather than general.
const FRAMEWORK_LANGUAGES: [(&str, &str); 13] = [
    ("react", "javascript"),
    ("vue", "javascript"),
    ("express", "javascript"),
    ("angular", "typescript"),
    ("next.js", "typescript"),
    ("nextjs", "typescript"),
    ("nestjs", "typescript"),
    ("nest", "typescript"),
    ("django", "python"),
    ("flask", "python"),
    ("fastapi", "python"),
    ("spring boot", "java"),
    ("spring", "java"),
];

const LANGUAGE_PROFILES: [LanguageProfile; 7] = [
    LanguageProfile {
        language: "javascript",
        prompt: "You are an expert JavaScript developer. Provide clear, modern \
JavaScript solutions using ES6+ features: async/await, modern array methods, \
destructuring, arrow functions and proper try/catch error handling. Always \
provide well-commented code examples and explain your reasoning.",
        keywords: &[
            "javascript", "js", "node", "npm", "promise", "es6", "jsx", "dom",
            "arrow function", "async", "await",
        ],
    },
    LanguageProfile {
        language: "python",
        prompt: "You are an expert Python developer. Provide clean, Pythonic \
solutions following PEP 8: comprehensions, generators, context managers, type \
hints where useful and try/except error handling. Document code with \
docstrings and prefer readable, idiomatic solutions.",
        keywords: &[
            "python", "pip", "pandas", "numpy", "pytest", "def ", "list comprehension",
            "virtualenv",
        ],
    },
    LanguageProfile {
        language: "java",
        prompt: "You are an expert Java developer. Provide object-oriented \
solutions following Java conventions: SOLID principles, the collections \
framework, streams and lambdas, and careful exception handling. Always \
provide well-structured, documented code.",
        keywords: &[
            "java", "maven", "gradle", "public class", "jvm", "jdk", "arraylist",
            "hashmap",
        ],
    },
    LanguageProfile {
        language: "typescript",
        prompt: "You are an expert TypeScript developer. Provide type-safe \
solutions with proper typing: interfaces, generics, type guards, and modern \
features like optional chaining. Avoid `any` and provide fully typed examples.",
        keywords: &[
            "typescript", "ts", "interface", "generic", "tsx", "type annotation",
            "type guard",
        ],
    },
    LanguageProfile {
        language: "cpp",
        prompt: "You are an expert C++ developer. Provide efficient, modern C++ \
solutions: smart pointers and RAII, STL containers and algorithms, templates \
where they help. Always provide well-commented code with proper conventions.",
        keywords: &["c++", "cpp", "#include", "std::", "iostream", "stl"],
    },
    LanguageProfile {
        language: "rust",
        prompt: "You are an expert Rust developer. Provide safe, efficient Rust \
solutions: ownership and borrowing, Result/Option error handling, traits and \
generics, async/await where appropriate. Always provide idiomatic Rust code.",
        keywords: &["rust", "cargo", "fn ", "&str", "ownership", "borrow", "trait", "unwrap"],
    },
    LanguageProfile {
        language: "go",
        prompt: "You are an expert Go developer. Provide clean, idiomatic Go \
solutions: goroutines and channels, explicit error handling, interfaces and \
composition. Always follow Go conventions and keep things simple.",
        keywords: &["golang", "go ", "goroutine", "channel", "func ", "defer", "slice"],
    },
];

/// Guesses the programming language a message is about, returning
/// [`GENERAL_LANGUAGE`] when nothing matches.
pub fn detect_language(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    for (framework, language) in FRAMEWORK_LANGUAGES {
        if lower.contains(framework) {
            return language;
        }
    }

    for profile in &LANGUAGE_PROFILES {
        if profile.keywords.iter().any(|k| lower.contains(k)) {
            return profile.language;
        }
    }

    GENERAL_LANGUAGE
}

/// Builds the system prompt for a message: the programming-only restriction,
/// the language-specific persona, and a continuity note when the conversation
/// already has history. Falls back to detecting the language across prior user
/// turns when the current message is inconclusive.
pub fn system_prompt(message: &str, prior_user_turns: &[String]) -> String {
    let mut language = detect_language(message);
    if language == GENERAL_LANGUAGE && !prior_user_turns.is_empty() {
        let joined = prior_user_turns.join(" ");
        language = detect_language(&joined);
    }

    let persona = LANGUAGE_PROFILES
        .iter()
        .find(|p| p.language == language)
        .map(|p| p.prompt)
        .unwrap_or(GENERAL_PROMPT);

    let mut prompt = format!("{PROGRAMMING_ONLY_RESTRICTION}\n\n{persona}");
    if !prior_user_turns.is_empty() {
        prompt.push_str(
            "\n\nNote: This is part of an ongoing conversation. Use the previous \
messages as context and stay consistent with the language and concepts \
discussed earlier.",
        );
    }
    prompt
}

/// Maps a raw classifier answer onto the fixed vocabulary, defaulting to
/// [`DEFAULT_CATEGORY`] for anything unrecognized.
pub fn normalize_category(raw: &str) -> &'static str {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    QUESTION_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .copied()
        .unwrap_or(DEFAULT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_language_from_keywords() {
        assert_eq!(detect_language("Why does my Python list comprehension fail?"), "python");
        assert_eq!(detect_language("cargo build says borrow of moved value"), "rust");
        assert_eq!(detect_language("how do I center a div"), "general");
    }

    #[test]
    fn frameworks_win_over_language_keywords() {
        assert_eq!(detect_language("How do Django async views work?"), "python");
        assert_eq!(detect_language("React useEffect runs twice"), "javascript");
    }

    #[test]
    fn system_prompt_falls_back_to_history() {
        let history = vec!["my pandas dataframe is slow".to_string()];
        let prompt = system_prompt("can you show an example?", &history);
        assert!(prompt.contains("Python"));
        assert!(prompt.contains("ongoing conversation"));
    }

    #[test]
    fn system_prompt_without_history_is_standalone() {
        let prompt = system_prompt("what is a pointer", &[]);
        assert!(!prompt.contains("ongoing conversation"));
        assert!(prompt.contains("programming assistant"));
    }

    #[test]
    fn normalize_category_matches_case_insensitively() {
        assert_eq!(normalize_category(" code debugging "), "Code Debugging");
        assert_eq!(normalize_category("\"Algorithm Help\""), "Algorithm Help");
        assert_eq!(normalize_category("Something Else"), DEFAULT_CATEGORY);
    }
}
