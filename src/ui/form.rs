//! The add-coin form
//!
//! Text fields map one-to-one onto [`NewCoin`]. Picked photographs and the
//! optional model are held as raw files until submission, when they are
//! embedded on the blocking pool.

use iced::widget::{button, column, container, row, text, text_input, Column};
use iced::{Element, Length, Task};

use crate::media::embed::{self, Attachments, PickedFile};
use crate::state::data::NewCoin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Date,
    Origin,
    Ruler,
    Material,
    Weight,
    Diameter,
    Description,
    Obverse,
    Reverse,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Date,
        Field::Origin,
        Field::Ruler,
        Field::Material,
        Field::Weight,
        Field::Diameter,
        Field::Description,
        Field::Obverse,
        Field::Reverse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name *",
            Field::Date => "Date *",
            Field::Origin => "Origin",
            Field::Ruler => "Ruler",
            Field::Material => "Material",
            Field::Weight => "Weight",
            Field::Diameter => "Diameter",
            Field::Description => "Description",
            Field::Obverse => "Obverse",
            Field::Reverse => "Reverse",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Field::Name => "e.g. Denarius of Julius Caesar",
            Field::Date => "e.g. 44 BC",
            Field::Origin => "e.g. Rome",
            Field::Ruler => "e.g. Julius Caesar",
            Field::Material => "e.g. Silver",
            Field::Weight => "e.g. 3.9 g",
            Field::Diameter => "e.g. 19 mm",
            Field::Description => "Condition, provenance, notes",
            Field::Obverse => "Front side design",
            Field::Reverse => "Back side design",
        }
    }

    fn value(self, coin: &NewCoin) -> &str {
        match self {
            Field::Name => &coin.name,
            Field::Date => &coin.date,
            Field::Origin => &coin.origin,
            Field::Ruler => &coin.ruler,
            Field::Material => &coin.material,
            Field::Weight => &coin.weight,
            Field::Diameter => &coin.diameter,
            Field::Description => &coin.description,
            Field::Obverse => &coin.obverse,
            Field::Reverse => &coin.reverse,
        }
    }

    fn value_mut(self, coin: &mut NewCoin) -> &mut String {
        match self {
            Field::Name => &mut coin.name,
            Field::Date => &mut coin.date,
            Field::Origin => &mut coin.origin,
            Field::Ruler => &mut coin.ruler,
            Field::Material => &mut coin.material,
            Field::Weight => &mut coin.weight,
            Field::Diameter => &mut coin.diameter,
            Field::Description => &mut coin.description,
            Field::Obverse => &mut coin.obverse,
            Field::Reverse => &mut coin.reverse,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FormMessage {
    Edited(Field, String),
    PickImages,
    ImagesPicked(Vec<PickedFile>),
    PickModel,
    ModelPicked(Option<PickedFile>),
    ClearAttachments,
    Submit,
    Cancel,
}

/// What the application should do after a form update
pub enum FormAction {
    None,
    Run(Task<FormMessage>),
    Submit(NewCoin, Attachments),
    Close,
}

#[derive(Debug, Default)]
pub struct AddForm {
    values: NewCoin,
    attachments: Attachments,
    error: Option<String>,
    /// A submission is being embedded; further submits are ignored
    submitting: bool,
}

impl AddForm {
    pub fn update(&mut self, message: FormMessage) -> FormAction {
        match message {
            FormMessage::Edited(field, value) => {
                *field.value_mut(&mut self.values) = value;
                self.error = None;
                FormAction::None
            }
            FormMessage::PickImages => {
                FormAction::Run(Task::perform(embed::pick_images(), FormMessage::ImagesPicked))
            }
            FormMessage::ImagesPicked(files) => {
                self.attachments.images.extend(files);
                FormAction::None
            }
            FormMessage::PickModel => {
                FormAction::Run(Task::perform(embed::pick_model(), FormMessage::ModelPicked))
            }
            FormMessage::ModelPicked(file) => {
                if file.is_some() {
                    self.attachments.model = file;
                }
                FormAction::None
            }
            FormMessage::ClearAttachments => {
                self.attachments = Attachments::default();
                FormAction::None
            }
            FormMessage::Submit => {
                if self.submitting {
                    return FormAction::None;
                }
                if let Some(field) = self.values.missing_field() {
                    self.error = Some(format!("Please fill in the coin's {}.", field));
                    return FormAction::None;
                }
                self.submitting = true;
                FormAction::Submit(self.values.clone(), self.attachments.clone())
            }
            FormMessage::Cancel => FormAction::Close,
        }
    }

    /// Clear every field and attachment, after a successful add
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Show an error that happened after submission. The form can be
    /// submitted again.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.submitting = false;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn view(&self) -> Element<'_, FormMessage> {
        let fields = Field::ALL
            .into_iter()
            .fold(Column::new().spacing(8), |fields, field| {
                fields.push(
                    row![
                        text(field.label()).width(Length::Fixed(110.0)),
                        text_input(field.placeholder(), field.value(&self.values))
                            .on_input(move |value| FormMessage::Edited(field, value))
                            .on_submit(FormMessage::Submit),
                    ]
                    .spacing(10),
                )
            });

        let model_name = self
            .attachments
            .model
            .as_ref()
            .map_or("none", |model| model.name.as_str());
        let attachments = row![
            button("Add photos").on_press(FormMessage::PickImages),
            button("Add 3D model").on_press(FormMessage::PickModel),
            button("Clear")
                .style(button::secondary)
                .on_press(FormMessage::ClearAttachments),
            text(format!(
                "{} photos, model: {}",
                self.attachments.images.len(),
                model_name
            ))
            .size(14),
        ]
        .spacing(10);

        let mut content = column![text("Add a coin").size(22), fields, attachments].spacing(14);

        if let Some(error) = &self.error {
            content = content.push(text(error).style(text::danger));
        }

        content = content.push(
            row![
                button(if self.submitting { "Saving..." } else { "Save coin" })
                    .style(button::success)
                    .on_press_maybe((!self.submitting).then_some(FormMessage::Submit)),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(FormMessage::Cancel),
            ]
            .spacing(10),
        );

        container(content)
            .padding(20)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut AddForm, field: Field, value: &str) {
        assert!(matches!(
            form.update(FormMessage::Edited(field, value.to_string())),
            FormAction::None
        ));
    }

    #[test]
    fn test_submit_requires_name_and_date() {
        let mut form = AddForm::default();
        assert!(matches!(form.update(FormMessage::Submit), FormAction::None));
        assert_eq!(form.error(), Some("Please fill in the coin's name."));

        fill(&mut form, Field::Name, "Denarius");
        assert_eq!(form.error(), None);
        assert!(matches!(form.update(FormMessage::Submit), FormAction::None));
        assert_eq!(form.error(), Some("Please fill in the coin's date."));
    }

    #[test]
    fn test_submit_carries_values_and_files() {
        let mut form = AddForm::default();
        fill(&mut form, Field::Name, "Denarius");
        fill(&mut form, Field::Date, "100 BC");
        fill(&mut form, Field::Ruler, "Sulla");

        let photo = PickedFile {
            name: "front.png".to_string(),
            bytes: vec![1, 2, 3],
        };
        form.update(FormMessage::ImagesPicked(vec![photo.clone()]));
        form.update(FormMessage::ModelPicked(None));

        let FormAction::Submit(new_coin, attachments) = form.update(FormMessage::Submit) else {
            panic!("expected a submission");
        };
        assert_eq!(new_coin.name, "Denarius");
        assert_eq!(new_coin.ruler, "Sulla");
        assert_eq!(attachments.images, vec![photo]);
        assert_eq!(attachments.model, None);
    }

    #[test]
    fn test_submit_is_ignored_while_embedding() {
        let mut form = AddForm::default();
        fill(&mut form, Field::Name, "Aureus");
        fill(&mut form, Field::Date, "27 BC");

        assert!(matches!(form.update(FormMessage::Submit), FormAction::Submit(..)));
        assert!(form.is_submitting());
        assert!(matches!(form.update(FormMessage::Submit), FormAction::None));

        // A failed submission unlocks the form
        form.set_error("Failed to save collection");
        assert!(!form.is_submitting());
        assert!(matches!(form.update(FormMessage::Submit), FormAction::Submit(..)));

        // So does a successful one
        form.reset();
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut form = AddForm::default();
        fill(&mut form, Field::Name, "Denarius");
        form.update(FormMessage::ImagesPicked(vec![PickedFile {
            name: "a.png".to_string(),
            bytes: Vec::new(),
        }]));
        form.set_error("disk full");

        form.reset();
        assert_eq!(form.error(), None);
        assert!(form.attachments().images.is_empty());
        assert!(matches!(form.update(FormMessage::Submit), FormAction::None));
        assert_eq!(form.error(), Some("Please fill in the coin's name."));
    }
}
