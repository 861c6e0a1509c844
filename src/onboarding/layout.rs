//! Page layout — which form components appear on pages 2 and 3.
//!
//! Two invariants hold after every operation: each page hosts at least one
//! component, and a component sits on at most one page. Operations that
//! would break either are rejected and leave the layout untouched.

use serde::{Deserialize, Serialize};

use super::model::{ComponentKind, Page};
use crate::error::LayoutError;

/// Ordered component lists for the two configurable pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(rename = "2")]
    page_two: Vec<ComponentKind>,
    #[serde(rename = "3")]
    page_three: Vec<ComponentKind>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_two: vec![Page::Two.default_component()],
            page_three: vec![Page::Three.default_component()],
        }
    }
}

impl PageLayout {
    /// Build a layout from explicit page lists, rejecting invalid ones.
    pub fn try_from_pages(
        page_two: Vec<ComponentKind>,
        page_three: Vec<ComponentKind>,
    ) -> Result<Self, LayoutError> {
        let layout = Self {
            page_two,
            page_three,
        };
        layout.check()?;
        Ok(layout)
    }

    /// Rebuild a layout from stored `(page, component)` rows.
    ///
    /// Rows for unknown pages and repeated components are skipped. A page
    /// left empty gets its default component when that one is free, then
    /// any free component, and as a last resort one taken from the other page.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (u8, ComponentKind)>,
    {
        let mut layout = Self {
            page_two: Vec::new(),
            page_three: Vec::new(),
        };
        for (number, component) in rows {
            let Ok(page) = Page::try_from(number) else {
                tracing::warn!(page = number, %component, "Ignoring layout row for unknown page");
                continue;
            };
            if layout.page_of(component).is_some() {
                tracing::warn!(page = number, %component, "Ignoring duplicate layout row");
                continue;
            }
            layout.list_mut(page).push(component);
        }

        for page in Page::ALL {
            if !layout.components(page).is_empty() {
                continue;
            }
            let unassigned = layout.unassigned();
            let fill = if unassigned.contains(&page.default_component()) {
                Some(page.default_component())
            } else if let Some(first) = unassigned.first() {
                Some(*first)
            } else {
                // All three sit on the other page, so it can spare one.
                layout.list_mut(page.other()).pop()
            };
            if let Some(component) = fill {
                layout.list_mut(page).push(component);
            }
        }
        layout
    }

    /// Flatten to `(page, component)` rows in display order.
    pub fn to_rows(&self) -> Vec<(Page, ComponentKind)> {
        Page::ALL
            .into_iter()
            .flat_map(|page| self.components(page).iter().map(move |c| (page, *c)))
            .collect()
    }

    /// Components on `page`, in display order.
    pub fn components(&self, page: Page) -> &[ComponentKind] {
        match page {
            Page::Two => &self.page_two,
            Page::Three => &self.page_three,
        }
    }

    fn list_mut(&mut self, page: Page) -> &mut Vec<ComponentKind> {
        match page {
            Page::Two => &mut self.page_two,
            Page::Three => &mut self.page_three,
        }
    }

    /// The page hosting `component`, if any.
    pub fn page_of(&self, component: ComponentKind) -> Option<Page> {
        Page::ALL
            .into_iter()
            .find(|page| self.components(*page).contains(&component))
    }

    /// Components not placed on any page.
    pub fn unassigned(&self) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|c| self.page_of(*c).is_none())
            .collect()
    }

    /// Move `component` from `from` to the end of `to`.
    pub fn move_component(
        &mut self,
        component: ComponentKind,
        from: Page,
        to: Page,
    ) -> Result<(), LayoutError> {
        if !self.components(from).contains(&component) {
            return Err(LayoutError::NotOnPage {
                component,
                page: from,
            });
        }
        if from == to {
            return Ok(());
        }
        if self.components(from).len() <= 1 {
            return Err(LayoutError::WouldEmptyPage { page: from });
        }
        self.list_mut(from).retain(|c| *c != component);
        self.list_mut(to).push(component);
        Ok(())
    }

    /// Place `component` on `page`, taking it off the other page first.
    pub fn add_component(&mut self, component: ComponentKind, page: Page) -> Result<(), LayoutError> {
        match self.page_of(component) {
            Some(current) if current == page => Ok(()),
            Some(current) => self.move_component(component, current, page),
            None => {
                self.list_mut(page).push(component);
                Ok(())
            }
        }
    }

    /// Unassign `component` from `page`. Never leaves the page empty.
    pub fn remove_component(
        &mut self,
        component: ComponentKind,
        page: Page,
    ) -> Result<(), LayoutError> {
        if !self.components(page).contains(&component) {
            return Err(LayoutError::NotOnPage { component, page });
        }
        if self.components(page).len() <= 1 {
            return Err(LayoutError::WouldEmptyPage { page });
        }
        self.list_mut(page).retain(|c| *c != component);
        Ok(())
    }

    /// Verify both invariants. Used on layouts that arrive whole.
    pub fn check(&self) -> Result<(), LayoutError> {
        let mut seen = Vec::with_capacity(ComponentKind::ALL.len());
        for page in Page::ALL {
            let components = self.components(page);
            if components.is_empty() {
                return Err(LayoutError::EmptyPage { page });
            }
            for component in components {
                if seen.contains(component) {
                    return Err(LayoutError::Duplicate {
                        component: *component,
                    });
                }
                seen.push(*component);
            }
        }
        Ok(())
    }
}
