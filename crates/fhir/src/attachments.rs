//! Attachment capability per resource shape.
//!
//! Every shape that embeds attachments implements [`AttachmentHolder`]. Slots are reported in
//! document order, and a slot may be empty (`None`) where the shape allows an absent
//! attachment. Callers must skip empty slots, never fail on them.
//!
//! Slot order is deterministic for a given resource value, so the slot position identifies an
//! attachment within that value.

use crate::data_types::Attachment;
use crate::resources::{
    DiagnosticReport, DocumentReference, DocumentReferenceContent, Media, Observation, Patient,
    Questionnaire, QuestionnaireItem, QuestionnaireResponse, QuestionnaireResponseAnswer,
    QuestionnaireResponseItem,
};

/// Access to the attachment slots of one resource shape.
pub trait AttachmentHolder {
    /// All attachment slots in document order.
    fn attachments(&self) -> Vec<Option<&Attachment>>;

    /// Mutable view of the attachment slots, same order as [`Self::attachments`].
    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>>;

    /// Replace the attachments positionally.
    ///
    /// List-backed shapes are resized to `attachments`. Shapes with fixed slots fill their
    /// existing slots in order, empty the remaining ones and ignore surplus entries.
    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>);
}

/// Fill fixed slots in order; slots beyond the supplied list are emptied.
fn fill_slots(slots: Vec<&mut Option<Attachment>>, attachments: Vec<Option<Attachment>>) {
    let mut attachments = attachments.into_iter();
    for slot in slots {
        *slot = attachments.next().flatten();
    }
}

impl AttachmentHolder for DocumentReference {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        self.content.iter().map(|c| c.attachment.as_ref()).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        self.content
            .iter_mut()
            .map(|c| c.attachment.as_mut())
            .collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        self.content.truncate(attachments.len());
        for (index, attachment) in attachments.into_iter().enumerate() {
            match self.content.get_mut(index) {
                Some(content) => content.attachment = attachment,
                None => self.content.push(DocumentReferenceContent::new(attachment)),
            }
        }
    }
}

impl AttachmentHolder for Patient {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        self.photo.iter().map(Some).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        self.photo.iter_mut().map(Some).collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        self.photo = attachments.into_iter().flatten().collect();
    }
}

impl AttachmentHolder for DiagnosticReport {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        self.presented_form.iter().map(Some).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        self.presented_form.iter_mut().map(Some).collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        self.presented_form = attachments.into_iter().flatten().collect();
    }
}

impl Observation {
    fn slots(&self) -> Vec<&Option<Attachment>> {
        std::iter::once(&self.value_attachment)
            .chain(self.component.iter().map(|c| &c.value_attachment))
            .collect()
    }

    fn slots_mut(&mut self) -> Vec<&mut Option<Attachment>> {
        std::iter::once(&mut self.value_attachment)
            .chain(self.component.iter_mut().map(|c| &mut c.value_attachment))
            .collect()
    }
}

impl AttachmentHolder for Observation {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        self.slots().into_iter().map(Option::as_ref).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        self.slots_mut().into_iter().map(Option::as_mut).collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        fill_slots(self.slots_mut(), attachments);
    }
}

impl AttachmentHolder for Media {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        vec![self.content.as_ref()]
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        vec![self.content.as_mut()]
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        fill_slots(vec![&mut self.content], attachments);
    }
}

fn questionnaire_slots<'a>(items: &'a [QuestionnaireItem], out: &mut Vec<&'a Option<Attachment>>) {
    for item in items {
        out.push(&item.initial_attachment);
        out.extend(item.initial.iter().map(|i| &i.value_attachment));
        questionnaire_slots(&item.item, out);
    }
}

fn questionnaire_slots_mut<'a>(
    items: &'a mut [QuestionnaireItem],
    out: &mut Vec<&'a mut Option<Attachment>>,
) {
    for item in items {
        let QuestionnaireItem {
            initial_attachment,
            initial,
            item: children,
            ..
        } = item;
        out.push(initial_attachment);
        out.extend(initial.iter_mut().map(|i| &mut i.value_attachment));
        questionnaire_slots_mut(children, out);
    }
}

impl AttachmentHolder for Questionnaire {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        let mut slots = Vec::new();
        questionnaire_slots(&self.item, &mut slots);
        slots.into_iter().map(Option::as_ref).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        let mut slots = Vec::new();
        questionnaire_slots_mut(&mut self.item, &mut slots);
        slots.into_iter().map(Option::as_mut).collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        let mut slots = Vec::new();
        questionnaire_slots_mut(&mut self.item, &mut slots);
        fill_slots(slots, attachments);
    }
}

fn response_slots<'a>(
    items: &'a [QuestionnaireResponseItem],
    out: &mut Vec<&'a Option<Attachment>>,
) {
    for item in items {
        for answer in &item.answer {
            out.push(&answer.value_attachment);
            response_slots(&answer.item, out);
        }
        response_slots(&item.item, out);
    }
}

fn response_slots_mut<'a>(
    items: &'a mut [QuestionnaireResponseItem],
    out: &mut Vec<&'a mut Option<Attachment>>,
) {
    for item in items {
        let QuestionnaireResponseItem {
            answer,
            item: children,
            ..
        } = item;
        for QuestionnaireResponseAnswer {
            value_attachment,
            item: nested,
            ..
        } in answer.iter_mut()
        {
            out.push(value_attachment);
            response_slots_mut(nested, out);
        }
        response_slots_mut(children, out);
    }
}

impl AttachmentHolder for QuestionnaireResponse {
    fn attachments(&self) -> Vec<Option<&Attachment>> {
        let mut slots = Vec::new();
        response_slots(&self.item, &mut slots);
        slots.into_iter().map(Option::as_ref).collect()
    }

    fn attachments_mut(&mut self) -> Vec<Option<&mut Attachment>> {
        let mut slots = Vec::new();
        response_slots_mut(&mut self.item, &mut slots);
        slots.into_iter().map(Option::as_mut).collect()
    }

    fn set_attachments(&mut self, attachments: Vec<Option<Attachment>>) {
        let mut slots = Vec::new();
        response_slots_mut(&mut self.item, &mut slots);
        fill_slots(slots, attachments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ObservationComponent, QuestionnaireItemInitial};

    fn attachment(id: &str) -> Attachment {
        Attachment {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    fn ids(holder: &dyn AttachmentHolder) -> Vec<Option<String>> {
        holder
            .attachments()
            .into_iter()
            .map(|a| a.and_then(|a| a.id.clone()))
            .collect()
    }

    #[test]
    fn document_reference_reports_null_slots() {
        let doc = DocumentReference {
            content: vec![
                DocumentReferenceContent::new(Some(attachment("a"))),
                DocumentReferenceContent::new(None),
            ],
            ..Default::default()
        };

        assert_eq!(ids(&doc), vec![Some("a".to_string()), None]);
    }

    #[test]
    fn document_reference_set_attachments_resizes_content() {
        let mut doc = DocumentReference {
            content: vec![DocumentReferenceContent::new(Some(attachment("a")))],
            ..Default::default()
        };

        doc.set_attachments(vec![Some(attachment("b")), Some(attachment("c"))]);
        assert_eq!(ids(&doc), vec![Some("b".into()), Some("c".into())]);

        doc.set_attachments(vec![]);
        assert!(doc.content.is_empty());
    }

    #[test]
    fn observation_orders_value_before_components() {
        let mut observation = Observation {
            value_attachment: Some(attachment("value")),
            component: vec![
                ObservationComponent {
                    value_attachment: None,
                    ..Default::default()
                },
                ObservationComponent {
                    value_attachment: Some(attachment("second")),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            ids(&observation),
            vec![Some("value".into()), None, Some("second".into())]
        );

        for slot in observation.attachments_mut().into_iter().flatten() {
            slot.data = Some("AAAA".into());
        }
        let second = observation.component[1].value_attachment.as_ref().unwrap();
        assert_eq!(second.data.as_deref(), Some("AAAA"));
    }

    #[test]
    fn observation_set_attachments_empties_remaining_slots() {
        let mut observation = Observation {
            value_attachment: Some(attachment("value")),
            component: vec![ObservationComponent {
                value_attachment: Some(attachment("component")),
                ..Default::default()
            }],
            ..Default::default()
        };

        observation.set_attachments(vec![Some(attachment("replaced"))]);

        assert_eq!(ids(&observation), vec![Some("replaced".into()), None]);
    }

    #[test]
    fn questionnaire_walks_nested_items() {
        let questionnaire = Questionnaire {
            item: vec![QuestionnaireItem {
                initial_attachment: Some(attachment("stu3")),
                initial: vec![QuestionnaireItemInitial {
                    value_attachment: Some(attachment("r4")),
                    ..Default::default()
                }],
                item: vec![QuestionnaireItem {
                    initial_attachment: Some(attachment("nested")),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_eq!(
            ids(&questionnaire),
            vec![Some("stu3".into()), Some("r4".into()), Some("nested".into())]
        );
    }

    #[test]
    fn questionnaire_response_walks_answers_and_items() {
        let mut response = QuestionnaireResponse {
            item: vec![QuestionnaireResponseItem {
                answer: vec![QuestionnaireResponseAnswer {
                    value_attachment: Some(attachment("answer")),
                    item: vec![QuestionnaireResponseItem {
                        answer: vec![QuestionnaireResponseAnswer {
                            value_attachment: Some(attachment("deep")),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                item: vec![QuestionnaireResponseItem {
                    answer: vec![QuestionnaireResponseAnswer::default()],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert_eq!(
            ids(&response),
            vec![Some("answer".into()), Some("deep".into()), None]
        );

        response.set_attachments(vec![None, Some(attachment("x")), Some(attachment("y"))]);
        assert_eq!(
            ids(&response),
            vec![None, Some("x".into()), Some("y".into())]
        );
    }

    #[test]
    fn patient_photos_are_never_null_slots() {
        let mut patient = Patient {
            photo: vec![attachment("p1")],
            ..Default::default()
        };

        patient.set_attachments(vec![None, Some(attachment("p2"))]);
        assert_eq!(ids(&patient), vec![Some("p2".into())]);
    }

    #[test]
    fn media_has_single_slot() {
        let mut media = Media::default();
        assert_eq!(ids(&media), vec![None]);

        media.set_attachments(vec![Some(attachment("m")), Some(attachment("ignored"))]);
        assert_eq!(ids(&media), vec![Some("m".into())]);
    }

    #[test]
    fn diagnostic_report_uses_presented_forms() {
        let report = DiagnosticReport {
            presented_form: vec![attachment("r1"), attachment("r2")],
            ..Default::default()
        };
        assert_eq!(ids(&report), vec![Some("r1".into()), Some("r2".into())]);
    }
}
