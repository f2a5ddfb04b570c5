use std::collections::HashSet;

use crate::{
    error::{FlowError, Result},
    event::EventType,
    question::{DependencyCondition, ElementType, Lov, Question, Validation, question_ids},
};

/// Ordered, validated set of FNOL questions. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Build a catalog, rejecting duplicate ids and conditions that read
    /// answers the catalog cannot produce.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.as_str()) {
                return Err(FlowError::CatalogIntegrity(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
        }

        for question in &questions {
            let Some(referenced) = question.condition.referenced_question() else {
                continue;
            };
            let target = questions.iter().find(|q| q.id == referenced).ok_or_else(|| {
                FlowError::CatalogIntegrity(format!(
                    "question '{}' depends on missing question '{}'",
                    question.id, referenced
                ))
            })?;

            if let DependencyCondition::EventTypeAndDriving(_, driving) = &question.condition {
                let admissible = target
                    .lovs
                    .as_ref()
                    .is_some_and(|lovs| lovs.iter().any(|lov| &lov.value == driving));
                if !admissible {
                    return Err(FlowError::CatalogIntegrity(format!(
                        "question '{}' depends on '{}' = '{}', which is not one of its values",
                        question.id, referenced, driving
                    )));
                }
            }
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The auto-policy FNOL questionnaire: one named driver, one insured vehicle.
    pub fn auto_policy() -> Result<Self> {
        use EventType::*;

        let vehicle_events = [
            Collision,
            InjuredAPedestrian,
            DamageCausedByWeather,
            DamageCausedByFire,
            DamageCausedByAnimals,
            VehicleVandalized,
            VehicleBrokenIntoOrStolen,
        ];
        let drivable_events = [
            InjuredAPedestrian,
            DamageCausedByWeather,
            DamageCausedByFire,
            DamageCausedByAnimals,
            VehicleVandalized,
            VehicleBrokenIntoOrStolen,
            OtherVehicleDamage,
        ];
        let other_driver = || DependencyCondition::EventTypeAndDriving(Collision, "other".into());

        let event_lovs = EventType::ALL
            .iter()
            .map(|e| Lov::new(e.as_str(), e.label()).with_description(e.definition()))
            .collect();

        let questions = vec![
            Question::new(question_ids::EVENT_TYPE, ElementType::Select, "Select Event")
                .lovs(event_lovs),
            Question::new(
                "whichVehicleInvolved",
                ElementType::Radio,
                "Which of your vehicles was involved?",
            )
            .description(
                "Relevant for collision, injured-a-pedestrian, damage caused by weather/fire/animals, vandalism, theft, or other damage claims.",
            )
            .lovs(vec![
                Lov::new("2023-bmw-x1", "2023 BMW X1"),
                Lov::new("rental-car", "Rental Car"),
                Lov::new("other", "Other car not on policy"),
            ])
            .when(DependencyCondition::event_type_in(
                vehicle_events.into_iter().chain([OtherVehicleDamage]),
            )),
            Question::new(
                question_ids::WHO_WAS_DRIVING,
                ElementType::Radio,
                "Who was driving the vehicle?",
            )
            .description("Select the person driving during the event.")
            .lovs(vec![
                Lov::new("driver-1", "Billy BadDriver").with_description(
                    "Main driver on the account; select if the collision is described in first person.",
                ),
                Lov::new("other", "Other"),
                Lov::new(
                    "not-driven-when-damage-occured",
                    "Vehicle was not being driven at the time of damage",
                ),
            ])
            .when(DependencyCondition::event_type_in(vehicle_events)),
            Question::new("otherDriverFirstName", ElementType::Input, "Other Driver First Name")
                .description("Provide the first name of the other driver if 'Other' was selected.")
                .optional()
                .when(other_driver()),
            Question::new("otherDriverLastName", ElementType::Input, "Other Driver Last Name")
                .description("Provide the last name of the other driver if 'Other' was selected.")
                .optional()
                .when(other_driver()),
            Question::new(
                "otherDriverPhoneNumber",
                ElementType::InputPhone,
                "Other Driver Phone Number",
            )
            .description("Provide the phone number of the other driver if applicable.")
            .optional()
            .validation(Validation::phone())
            .when(other_driver()),
            Question::new("wasVehicleTowed", ElementType::YesOrNo, "Was your vehicle towed?")
                .description("Select whether the vehicle required towing.")
                .when(DependencyCondition::event_type_in(vehicle_events)),
            Question::new(
                "wasVehicleGlassDamaged",
                ElementType::YesOrNo,
                "Was any of your vehicle's glass damaged?",
            )
            .description("Select whether the vehicle's glass was damaged.")
            .when(DependencyCondition::event_type_in(vehicle_events)),
            Question::new("wereFatalities", ElementType::YesOrNo, "Fatalities?")
                .description("Indicate if any fatalities occurred during the event.")
                .when(DependencyCondition::event_type_in([
                    Collision,
                    InjuredAsPedestrian,
                    InjuredAPedestrian,
                ])),
            Question::new(question_ids::WERE_INJURIES, ElementType::YesOrNo, "Injuries?")
                .description("Indicate if there were injuries (fatalities imply injuries).")
                .when(DependencyCondition::event_type_in([Collision])),
            Question::new(
                "numOtherVehicles",
                ElementType::Numeric,
                "How many other vehicles were involved?",
            )
            .description(
                "Provide the number of additional vehicles involved (as a string integer), or '0' if none.",
            )
            .when(DependencyCondition::event_type_in([Collision, InjuredAPedestrian])),
            Question::new("injuredParty", ElementType::Checkbox, "Insured (Injured Party)")
                .description("Select the injured party that is also insured on the policy.")
                .lovs(vec![
                    Lov::new("driver-1", "Billy BadDriver"),
                    Lov::new("other", "Other"),
                ])
                .when(DependencyCondition::event_type_in([InjuredAsPedestrian])),
            Question::new(
                "vehicleDriverFirstName",
                ElementType::Input,
                "Vehicle Driver's First Name",
            )
            .description("Provide the first name of the external driver involved.")
            .optional()
            .when(DependencyCondition::event_type_in([InjuredAsPedestrian])),
            Question::new(
                "vehicleDriverLastName",
                ElementType::Input,
                "Vehicle Driver's Last Name",
            )
            .description("Provide the last name of the external driver involved.")
            .optional()
            .when(DependencyCondition::event_type_in([InjuredAsPedestrian])),
            Question::new(
                "vehicleDriverPhoneNumber",
                ElementType::InputPhone,
                "Vehicle Driver's Phone Number",
            )
            .description("Provide the phone number of the external driver involved.")
            .optional()
            .validation(Validation::phone())
            .when(DependencyCondition::event_type_in([InjuredAsPedestrian])),
            Question::new(
                "isVehicleDrivable",
                ElementType::YesOrNoOrUnknown,
                "Is the Vehicle Drivable?",
            )
            .description("Select whether the vehicle remains operable after the event.")
            .when(DependencyCondition::event_type_in(drivable_events)),
        ];

        Self::new(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_policy_catalog_is_valid() {
        let catalog = QuestionCatalog::auto_policy().unwrap();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.questions()[0].id, question_ids::EVENT_TYPE);
        assert_eq!(
            catalog.get("numOtherVehicles").map(|q| q.element_type),
            Some(ElementType::Numeric)
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = QuestionCatalog::new(vec![
            Question::new("a", ElementType::Input, "A"),
            Question::new("a", ElementType::Input, "A again"),
        ]);
        assert!(matches!(result, Err(FlowError::CatalogIntegrity(msg)) if msg.contains("'a'")));
    }

    #[test]
    fn condition_on_missing_question_is_rejected() {
        let result = QuestionCatalog::new(vec![
            Question::new("injuryDetails", ElementType::Input, "Details").when(
                DependencyCondition::EventTypeAndInjuries(EventType::Collision, true),
            ),
        ]);
        assert!(matches!(
            result,
            Err(FlowError::CatalogIntegrity(msg)) if msg.contains("wereInjuries")
        ));
    }

    #[test]
    fn driving_value_must_be_admissible() {
        let result = QuestionCatalog::new(vec![
            Question::new(question_ids::WHO_WAS_DRIVING, ElementType::Radio, "Who?")
                .lovs(vec![Lov::new("driver-1", "Me"), Lov::new("other", "Other")]),
            Question::new("otherDriverFirstName", ElementType::Input, "First name").when(
                DependencyCondition::EventTypeAndDriving(EventType::Collision, "nobody".into()),
            ),
        ]);
        assert!(matches!(result, Err(FlowError::CatalogIntegrity(_))));
    }
}
