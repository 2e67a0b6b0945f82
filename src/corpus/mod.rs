//! Read-only practice material compiled into the binary: test texts, game
//! words, lessons and the canned chatbot replies.
use crate::error::{TmResult, TypemasterError};
use crate::session::Difficulty;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

/// Entries keyed by difficulty level.
#[derive(Deserialize, Clone, Debug)]
pub struct Tiered {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

impl Tiered {
    pub fn get(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    /// Skill level label such as "beginner" or "expert".
    pub difficulty: String,
}

impl Lesson {
    fn not_found() -> Self {
        Self {
            id: "0".into(),
            title: "Lesson Not Found".into(),
            description: "The requested lesson could not be found.".into(),
            content: "Please select a valid lesson.".into(),
            difficulty: "N/A".into(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct ChatReply {
    pattern: String,
    response: String,
}

#[derive(Deserialize, Clone, Debug)]
struct Chatbot {
    fallback: String,
    replies: Vec<ChatReply>,
}

#[derive(Clone, Debug)]
pub struct Corpus {
    texts: Tiered,
    words: Tiered,
    lessons: Vec<Lesson>,
    chatbot: Chatbot,
}

impl Corpus {
    pub fn load() -> TmResult<Self> {
        Ok(Self {
            texts: read_corpus_file("texts.json")?,
            words: read_corpus_file("words.json")?,
            lessons: read_corpus_file("lessons.json")?,
            chatbot: read_corpus_file("chatbot.json")?,
        })
    }

    /// A random practice text; empty only if the tier has no texts.
    pub fn random_text(&self, difficulty: Difficulty) -> String {
        let mut rng = rand::thread_rng();
        self.texts
            .get(difficulty)
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Up to `count` distinct words for the typing game.
    pub fn random_words(&self, count: usize, difficulty: Difficulty) -> Vec<String> {
        let mut rng = rand::thread_rng();
        self.words
            .get(difficulty)
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    }

    pub fn texts(&self, difficulty: Difficulty) -> &[String] {
        self.texts.get(difficulty)
    }

    pub fn words(&self, difficulty: Difficulty) -> &[String] {
        self.words.get(difficulty)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// The lesson with this id, or a "not found" placeholder lesson.
    pub fn lesson(&self, id: &str) -> Lesson {
        self.lessons
            .iter()
            .find(|lesson| lesson.id == id)
            .cloned()
            .unwrap_or_else(Lesson::not_found)
    }

    pub fn has_lesson(&self, id: &str) -> bool {
        self.lessons.iter().any(|lesson| lesson.id == id)
    }

    /// First canned reply whose pattern occurs in the query, ignoring case.
    pub fn chatbot_reply(&self, query: &str) -> &str {
        let query = query.to_lowercase();
        self.chatbot
            .replies
            .iter()
            .find(|reply| query.contains(&reply.pattern.to_lowercase()))
            .map(|reply| reply.response.as_str())
            .unwrap_or(&self.chatbot.fallback)
    }
}

fn read_corpus_file<T: DeserializeOwned>(file_name: &str) -> TmResult<T> {
    let file = CORPUS_DIR
        .get_file(file_name)
        .ok_or_else(|| TypemasterError::Corpus(format!("{file_name} not found")))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| TypemasterError::Corpus(format!("{file_name} is not valid UTF-8")))?;

    Ok(from_str(file_as_str)?)
}
