//! Edit message handlers
//!
//! Pointer and toolbar events arrive as [`EditMsg`] values and are applied
//! to the [`AnnotationModel`]. Recorded annotations are replayed through the
//! same path so scripted edits behave exactly like interactive ones.

use super::model::AnnotationModel;
use crate::config::ShapeColor;
use crate::domain::{Annotation, Point, Tool};
use crate::error::{Error, Result};

/// One editing event
#[derive(Clone, Debug, PartialEq)]
pub enum EditMsg {
    SelectTool {
        tool: Tool,
        color: Option<ShapeColor>,
        width: Option<u32>,
    },
    Press(Point),
    Drag(Point),
    Release(Point),
    /// Text entered for the pending label position
    SubmitText(String),
    Undo,
    Clear,
    Cancel,
}

/// Apply a message to the model
pub fn handle_edit_msg(model: &mut AnnotationModel, msg: EditMsg) -> Result<()> {
    match msg {
        EditMsg::SelectTool { tool, color, width } => model.set_active_tool(tool, color, width),
        EditMsg::Press(p) => model.begin_stroke(p),
        EditMsg::Drag(p) => model.update_stroke(p),
        EditMsg::Release(p) => model.end_stroke(p)?,
        EditMsg::SubmitText(text) => {
            if !model.add_text_annotation(&text) {
                log::debug!("Text submission ignored: {:?}", text);
            }
        }
        EditMsg::Undo => {
            model.undo_last();
        }
        EditMsg::Clear => model.clear(),
        EditMsg::Cancel => model.cancel(),
    }
    Ok(())
}

/// Messages a user would produce to draw `annotation`
pub fn messages_for(annotation: &Annotation) -> Vec<EditMsg> {
    match annotation {
        Annotation::Arrow(s) | Annotation::Box(s) | Annotation::Freehand(s) | Annotation::Blur(s) => {
            vec![
                EditMsg::SelectTool {
                    tool: annotation.tool(),
                    color: Some(s.color),
                    width: Some(s.stroke_width),
                },
                EditMsg::Press(s.start),
                EditMsg::Drag(s.end),
                EditMsg::Release(s.end),
            ]
        }
        Annotation::Text(t) => vec![
            EditMsg::SelectTool {
                tool: Tool::Text,
                color: Some(t.color),
                width: Some(t.stroke_width),
            },
            EditMsg::Press(t.position),
            EditMsg::SubmitText(t.text.clone()),
        ],
    }
}

/// Validate and replay recorded annotations in order
///
/// Returns the number of annotations applied.
pub fn replay(model: &mut AnnotationModel, annotations: &[Annotation]) -> Result<usize> {
    if model.image().is_none() {
        return Err(Error::NoImage);
    }
    for annotation in annotations {
        annotation.validate()?;
        for msg in messages_for(annotation) {
            handle_edit_msg(model, msg)?;
        }
    }
    log::debug!("Replayed {} annotations", annotations.len());
    Ok(annotations.len())
}
