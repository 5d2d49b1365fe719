//! UI-primitive accumulator: per-stream treetables built column by column
//! and row by row, with nested rows flattened into parent-linked nodes.

use hashbrown::HashMap;
use log::warn;

use super::validate_stream_matches_metadata;
use crate::data::{Metadata, TreeTableColumn, TreeTableNode, UiPrimitiveState};
use crate::types::{Category, TreeTableColumnType};

/// One row with nested children; flattened pre-order at flush.
#[derive(Clone, Debug)]
pub struct TreeTableRowBuilder {
    node: TreeTableNode,
    children: Vec<TreeTableRowBuilder>,
}

impl TreeTableRowBuilder {
    fn new(id: u32, values: Vec<String>) -> Self {
        TreeTableRowBuilder {
            node: TreeTableNode {
                id,
                parent: None,
                column_values: values,
            },
            children: Vec::new(),
        }
    }

    /// Add a child row and return it for further nesting.
    pub fn child(
        &mut self,
        id: u32,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut TreeTableRowBuilder {
        let mut row = TreeTableRowBuilder::new(id, values.into_iter().map(Into::into).collect());
        row.node.parent = Some(self.node.id);
        self.children.push(row);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    fn flatten_into(self, nodes: &mut Vec<TreeTableNode>) {
        nodes.push(self.node);
        for child in self.children {
            child.flatten_into(nodes);
        }
    }
}

#[derive(Clone, Debug)]
pub struct UiPrimitiveBuilder {
    metadata: Metadata,
    stream_id: String,
    pending_column: Option<TreeTableColumn>,
    pending_row: Option<TreeTableRowBuilder>,
    data: HashMap<String, UiPrimitiveState>,
}

impl UiPrimitiveBuilder {
    pub fn new(metadata: Metadata) -> Self {
        UiPrimitiveBuilder {
            metadata,
            stream_id: String::new(),
            pending_column: None,
            pending_row: None,
            data: HashMap::new(),
        }
    }

    pub fn stream(&mut self, stream_id: impl Into<String>) -> &mut Self {
        if !self.stream_id.is_empty() {
            self.flush();
        }
        self.stream_id = stream_id.into();
        self
    }

    pub fn column(
        &mut self,
        display_text: impl Into<String>,
        column_type: TreeTableColumnType,
        unit: Option<String>,
    ) -> &mut Self {
        self.flush_pending();
        self.pending_column = Some(TreeTableColumn {
            display_text: display_text.into(),
            column_type,
            unit,
        });
        self
    }

    /// Add a flat row. For nested rows use `row_builder`.
    pub fn row(
        &mut self,
        id: u32,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.flush_pending();
        self.pending_row = Some(TreeTableRowBuilder::new(
            id,
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Start a row and hand back its builder so children can be attached.
    pub fn row_builder(&mut self, id: u32) -> &mut TreeTableRowBuilder {
        self.flush_pending();
        self.pending_row
            .insert(TreeTableRowBuilder::new(id, Vec::new()))
    }

    fn flush_pending(&mut self) {
        if self.pending_column.is_none() && self.pending_row.is_none() {
            return;
        }
        if self.stream_id.is_empty() {
            warn!("UI primitive data committed before any stream was selected");
        }
        let table = &mut self
            .data
            .entry(self.stream_id.clone())
            .or_default()
            .treetable;
        if let Some(column) = self.pending_column.take() {
            table.columns.push(column);
        }
        if let Some(row) = self.pending_row.take() {
            row.flatten_into(&mut table.nodes);
        }
    }

    fn flush(&mut self) {
        if self.pending_column.is_none() && self.pending_row.is_none() {
            return;
        }
        validate_stream_matches_metadata(&self.metadata, &self.stream_id, Category::UiPrimitive);
        self.flush_pending();
    }

    /// Flush and drain everything accumulated since the last call.
    pub fn get_data(&mut self) -> Option<HashMap<String, UiPrimitiveState>> {
        self.flush();
        self.stream_id.clear();
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data))
    }
}
