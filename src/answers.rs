//! Visitor reflections: validation, note placement and the pending write.

use std::ops::RangeInclusive;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Answer, NewAnswer, NoteColor, Position};

pub const X_RANGE: RangeInclusive<f64> = 10.0..=70.0;
pub const Y_RANGE: RangeInclusive<f64> = 10.0..=60.0;
pub const ROTATION_RANGE: RangeInclusive<f64> = -5.0..=5.0;

pub const PLACEHOLDER_QUESTION: &str = "An open reflection";
pub const PENDING_MESSAGE: &str =
    "Thank you for your reflection. It will appear on the board once reviewed.";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub contemplation_id: Option<i64>,
    #[serde(default)]
    pub question: Option<String>,
}

impl AnswerSubmission {
    pub fn validate(&self) -> Result<()> {
        if self.answer.trim().is_empty() {
            return Err(AppError::validation("Answer is required"));
        }
        if self.author.trim().is_empty() {
            return Err(AppError::validation("Author is required"));
        }
        Ok(())
    }
}

/// Where a note sits on the board. Chosen once, at submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Position,
    pub rotation: f64,
    pub color: NoteColor,
}

impl Placement {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            position: Position {
                x: rng.random_range(X_RANGE),
                y: rng.random_range(Y_RANGE),
            },
            rotation: rng.random_range(ROTATION_RANGE),
            color: *NoteColor::PALETTE.choose(rng).unwrap_or(&NoteColor::Gold),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedAnswer {
    pub answer: Answer,
    pub message: &'static str,
}

/// Validate and store a reflection as unapproved.
///
/// The question text comes from the linked contemplation when it exists,
/// then from the literal question sent along, then a placeholder. A link to
/// a contemplation that no longer exists is dropped.
pub async fn submit_answer(
    repo: &Repository,
    submission: AnswerSubmission,
    placement: Placement,
) -> Result<SubmittedAnswer> {
    submission.validate()?;

    let linked = match submission.contemplation_id {
        Some(id) => repo.get_contemplation(id).await?,
        None => None,
    };

    let question = match &linked {
        Some(contemplation) => contemplation.question.clone(),
        None => submission
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(PLACEHOLDER_QUESTION)
            .to_string(),
    };

    let answer = repo
        .insert_answer(NewAnswer {
            contemplation_id: linked.map(|c| c.id),
            question,
            answer: submission.answer.trim().to_string(),
            author: submission.author.trim().to_string(),
            color: placement.color,
            position: placement.position,
            rotation: placement.rotation,
        })
        .await?;

    tracing::info!(id = answer.id, "Reflection submitted for review");

    Ok(SubmittedAnswer {
        answer,
        message: PENDING_MESSAGE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerFilter, NewContemplation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn submission(answer: &str, author: &str) -> AnswerSubmission {
        AnswerSubmission {
            answer: answer.into(),
            author: author.into(),
            contemplation_id: None,
            question: None,
        }
    }

    #[test]
    fn placement_stays_inside_the_board() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let p = Placement::random(&mut rng);
            assert!(X_RANGE.contains(&p.position.x));
            assert!(Y_RANGE.contains(&p.position.y));
            assert!(ROTATION_RANGE.contains(&p.rotation));
            assert!(NoteColor::PALETTE.contains(&p.color));
        }
    }

    #[tokio::test]
    async fn blank_author_is_rejected_without_a_write() {
        let repo = Repository::open_in_memory().await.unwrap();
        let placement = Placement::random(&mut StdRng::seed_from_u64(1));

        let err = submit_answer(&repo, submission("Courage", "   "), placement)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = submit_answer(&repo, submission("", "Zeno"), placement)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(repo.list_answers(AnswerFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_answers_are_pending_and_take_the_linked_question() {
        let repo = Repository::open_in_memory().await.unwrap();
        let c = repo
            .insert_contemplation(NewContemplation {
                question: "What is courage?".into(),
                active: None,
                featured: None,
            })
            .await
            .unwrap();

        let mut sub = submission("  Wisdom about what to fear  ", "Laches");
        sub.contemplation_id = Some(c.id);
        sub.question = Some("ignored".into());
        let placement = Placement::random(&mut StdRng::seed_from_u64(5));

        let created = submit_answer(&repo, sub, placement).await.unwrap();
        assert!(!created.answer.approved);
        assert_eq!(created.answer.question, "What is courage?");
        assert_eq!(created.answer.answer, "Wisdom about what to fear");
        assert_eq!(created.answer.contemplation_id, Some(c.id));
        assert_eq!(created.answer.position, placement.position);
        assert_eq!(created.message, PENDING_MESSAGE);
    }

    #[tokio::test]
    async fn question_falls_back_to_literal_then_placeholder() {
        let repo = Repository::open_in_memory().await.unwrap();
        let placement = Placement::random(&mut StdRng::seed_from_u64(9));

        let mut sub = submission("Yes", "Diogenes");
        sub.contemplation_id = Some(77);
        sub.question = Some("Is a lamp needed at noon?".into());
        let created = submit_answer(&repo, sub, placement).await.unwrap();
        assert_eq!(created.answer.question, "Is a lamp needed at noon?");
        assert_eq!(created.answer.contemplation_id, None);

        let created = submit_answer(&repo, submission("No", "Crates"), placement)
            .await
            .unwrap();
        assert_eq!(created.answer.question, PLACEHOLDER_QUESTION);
    }
}
