//! Context menu of an interactive marker.
//!
//! Entries arrive as a flat list with parent ids (0 = top level) and are
//! assembled into a tree. Only leaves can be selected; entries with
//! children open sub-menus.

use glam::Vec2;
use marker_protocol::MenuEntryMsg;

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub id: u32,
    pub title: String,
    pub command: String,
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn find(&self, id: u32) -> Option<&MenuEntry> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut MenuEntry> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }
}

/// Where and for which control the menu is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMenu {
    pub control_name: String,
    /// Pointer position (NDC) that opened the menu
    pub position: Vec2,
}

/// A chosen leaf entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSelection {
    pub id: u32,
    pub control_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    root: MenuEntry,
    open: Option<OpenMenu>,
}

impl Menu {
    pub fn from_entries(entries: &[MenuEntryMsg]) -> Self {
        let mut root = MenuEntry {
            id: 0,
            title: String::new(),
            command: String::new(),
            children: Vec::new(),
        };

        // parents must precede children; repeat until nothing attaches
        let mut pending: Vec<&MenuEntryMsg> = entries.iter().collect();
        loop {
            let before = pending.len();
            pending.retain(|entry| {
                let Some(parent) = root.find_mut(entry.parent_id) else {
                    return true;
                };
                parent.children.push(MenuEntry {
                    id: entry.id,
                    title: entry.title.clone(),
                    command: entry.command.clone(),
                    children: Vec::new(),
                });
                false
            });
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        for entry in pending {
            tracing::warn!(
                "Menu entry {} ({}) has unknown parent {}, skipping",
                entry.id,
                entry.title,
                entry.parent_id
            );
        }

        Self { root, open: None }
    }

    /// Synthetic top-level entry (id 0) holding the menu tree.
    pub fn root(&self) -> &MenuEntry {
        &self.root
    }

    pub fn find(&self, id: u32) -> Option<&MenuEntry> {
        if id == 0 {
            return None;
        }
        self.root.find(id)
    }

    pub fn show(&mut self, control_name: &str, position: Vec2) {
        self.open = Some(OpenMenu {
            control_name: control_name.to_string(),
            position,
        });
    }

    pub fn hide(&mut self) {
        self.open = None;
    }

    pub fn open(&self) -> Option<&OpenMenu> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Select a leaf entry of the open menu; the menu closes.
    ///
    /// Returns `None` when the menu is closed or `id` is not a leaf.
    pub fn select(&mut self, id: u32) -> Option<MenuSelection> {
        let entry = self.find(id)?;
        if !entry.is_leaf() {
            return None;
        }
        let open = self.open.take()?;
        Some(MenuSelection {
            id,
            control_name: open.control_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, parent_id: u32, title: &str) -> MenuEntryMsg {
        MenuEntryMsg {
            id,
            parent_id,
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_entries() {
        let menu = Menu::from_entries(&[entry(1, 0, "A"), entry(2, 1, "B")]);
        let root = menu.root();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].title, "A");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].title, "B");
        assert!(root.children[0].children[0].is_leaf());
    }

    #[test]
    fn test_out_of_order_and_orphan_entries() {
        let menu = Menu::from_entries(&[entry(3, 1, "child"), entry(1, 0, "parent"), entry(9, 7, "orphan")]);
        assert_eq!(menu.root().children.len(), 1);
        assert_eq!(menu.find(3).unwrap().title, "child");
        assert!(menu.find(9).is_none());
    }

    #[test]
    fn test_select_leaf_only_while_open() {
        let mut menu = Menu::from_entries(&[entry(1, 0, "A"), entry(2, 1, "B")]);
        assert!(menu.select(2).is_none());

        menu.show("ctrl", Vec2::ZERO);
        assert!(menu.select(1).is_none());
        assert!(menu.is_open());

        let selection = menu.select(2).unwrap();
        assert_eq!(selection.id, 2);
        assert_eq!(selection.control_name, "ctrl");
        assert!(!menu.is_open());
    }
}
