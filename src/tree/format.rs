use super::ContentTree;
use crate::node::{Attr, AttrScope, AttrValue, BlockKind, NodeId, NodeKind, TreeError, Violation};
use std::collections::BTreeSet;

impl ContentTree {
    /// Toggles `attr` over the selection.
    ///
    /// Collapsed: records the desired value for the next insertion and
    /// touches no node. Otherwise: clears the attribute when every target
    /// already has it, sets it on all targets when any lacks it. Targets are
    /// validated before anything is written.
    pub fn format_toggle(&mut self, attr: Attr) -> Result<(), TreeError> {
        match attr.scope() {
            AttrScope::Character => self.toggle_character(attr),
            AttrScope::ListItem => self.toggle_list_item(attr),
        }
    }

    /// Formatting the next typed character would get.
    pub fn formats_at_cursor(&self) -> BTreeSet<Attr> {
        let leading = self.range.leading(&self.arena);
        let mut formats: BTreeSet<Attr> = self
            .inherited_formats(leading)
            .into_iter()
            .map(|(attr, _)| attr)
            .collect();
        for (attr, value) in self.range.pending_formats() {
            if *value {
                formats.insert(attr.clone());
            } else {
                formats.remove(attr);
            }
        }
        formats
    }

    fn toggle_character(&mut self, attr: Attr) -> Result<(), TreeError> {
        if self.is_collapsed() {
            let desired = !self.formats_at_cursor().contains(&attr);
            tracing::debug!(%attr, desired, "cached pending format");
            self.range.set_pending(attr, desired);
            return Ok(());
        }
        let targets: Vec<NodeId> = self
            .selected_nodes()
            .into_iter()
            .filter(|id| self.arena.get(*id).is_some_and(|n| n.is_character()))
            .collect();
        self.apply_toggle(attr, &targets)
    }

    fn toggle_list_item(&mut self, attr: Attr) -> Result<(), TreeError> {
        let sources = if self.is_collapsed() {
            vec![self.range.leading(&self.arena)]
        } else {
            self.selected_nodes()
        };
        let mut targets: Vec<NodeId> = Vec::new();
        for source in sources {
            let item = std::iter::once(source)
                .chain(self.arena.ancestors(source))
                .find(|id| {
                    self.arena
                        .get(*id)
                        .is_some_and(|n| matches!(n.kind(), NodeKind::Block(BlockKind::ListItem)))
                })
                .ok_or(Violation::AttributeScope {
                    attr: attr.clone(),
                    node: source,
                })?;
            if !targets.contains(&item) {
                targets.push(item);
            }
        }
        self.apply_toggle(attr, &targets)
    }

    fn apply_toggle(&mut self, attr: Attr, targets: &[NodeId]) -> Result<(), TreeError> {
        for target in targets {
            let node = self.arena.node(*target)?;
            if !attr.admits(node.kind()) {
                return Err(Violation::AttributeScope {
                    attr,
                    node: *target,
                }
                .into());
            }
        }
        let all_on = targets.iter().all(|id| {
            self.arena
                .get(*id)
                .is_some_and(|n| n.attributes().is_set(&attr))
        });
        for target in targets {
            if all_on {
                self.arena.clear_attribute(*target, &attr)?;
            } else {
                self.arena
                    .set_attribute(*target, attr.clone(), AttrValue::Bool(true))?;
            }
        }
        tracing::debug!(%attr, targets = targets.len(), cleared = all_on, "toggled format");
        Ok(())
    }
}
