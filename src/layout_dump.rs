use crate::layout::{ItemLabel, Layout, LayoutData};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: String,
    pub shape: Option<String>,
    pub solver: Option<String>,
    pub width: f32,
    pub height: f32,
    pub top_margin: f32,
    pub items: Vec<ItemDump>,
    pub dropped: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemDump {
    pub id: String,
    pub value: f32,
    pub value_text: String,
    pub group: Option<String>,
    pub color: String,
    pub size: f32,
    pub area: f32,
    pub x: f32,
    pub y: f32,
    pub label_mode: String,
    pub label_side: Option<String>,
    pub label_lines: Vec<String>,
    pub label_font_size: Option<f32>,
    pub truncated: bool,
    pub icon: bool,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        match &layout.diagram {
            LayoutData::Error(err) => LayoutDump {
                kind: "error".to_string(),
                shape: None,
                solver: None,
                width: layout.width,
                height: layout.height,
                top_margin: 0.0,
                items: Vec::new(),
                dropped: Vec::new(),
                error: Some(err.message.clone()),
            },
            LayoutData::Packed(data) => {
                let items = data
                    .items
                    .iter()
                    .map(|item| {
                        let mut dump = ItemDump {
                            id: item.id.clone(),
                            value: item.value,
                            value_text: item.value_text.clone(),
                            group: item.group.clone(),
                            color: item.color.clone(),
                            size: item.size,
                            area: item.area,
                            x: item.position.x,
                            y: item.position.y,
                            label_mode: item.label.mode().to_string(),
                            label_side: None,
                            label_lines: Vec::new(),
                            label_font_size: None,
                            truncated: false,
                            icon: false,
                        };
                        match &item.label {
                            ItemLabel::Internal(label) => {
                                if let Some(category) = &label.category {
                                    dump.label_lines.extend(category.block.lines.iter().cloned());
                                    dump.truncated |= category.block.truncated;
                                }
                                dump.label_lines.extend(label.value.block.lines.iter().cloned());
                                dump.label_font_size = Some(label.value.block.font_size);
                                dump.truncated |= label.value.block.truncated;
                                dump.icon = label.icon.is_some();
                            }
                            ItemLabel::External(label) => {
                                dump.label_side = Some(format!("{:?}", label.side).to_lowercase());
                                dump.label_lines = label.text.block.lines.clone();
                                dump.label_font_size = Some(label.text.block.font_size);
                                dump.truncated = label.text.block.truncated;
                            }
                            ItemLabel::Hidden => {}
                        }
                        dump
                    })
                    .collect();
                LayoutDump {
                    kind: "packed".to_string(),
                    shape: Some(data.shape.name().to_string()),
                    solver: Some(format!("{:?}", data.solver).to_lowercase()),
                    width: layout.width,
                    height: layout.height,
                    top_margin: data.canvas.top_margin,
                    items,
                    dropped: data.dropped.clone(),
                    error: None,
                }
            }
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
