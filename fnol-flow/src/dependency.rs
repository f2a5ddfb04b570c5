//! Question relevance.
//!
//! A question is relevant when its [`DependencyCondition`] holds for the
//! classified event type and the answers known so far. Conditions that read
//! an answer which is not yet in the context never hold.

use crate::{
    catalog::QuestionCatalog,
    context::AnswerContext,
    event::EventType,
    question::{DependencyCondition, Question, question_ids},
};

impl DependencyCondition {
    pub fn is_satisfied(&self, event_type: EventType, context: &AnswerContext) -> bool {
        match self {
            DependencyCondition::None => true,
            DependencyCondition::EventTypeIn(set) => set.contains(&event_type),
            DependencyCondition::EventTypeAndDriving(expected, driving) => {
                *expected == event_type
                    && context.text(question_ids::WHO_WAS_DRIVING) == Some(driving.as_str())
            }
            DependencyCondition::EventTypeAndInjuries(expected, injuries) => {
                *expected == event_type
                    && context.flag(question_ids::WERE_INJURIES) == Some(*injuries)
            }
        }
    }
}

/// Questions relevant to `event_type` and `context`, in catalog order.
pub fn relevant_questions<'a>(
    catalog: &'a QuestionCatalog,
    event_type: EventType,
    context: &AnswerContext,
) -> Vec<&'a Question> {
    catalog
        .iter()
        .filter(|q| q.condition.is_satisfied(event_type, context))
        .collect()
}
