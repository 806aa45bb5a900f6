//! Per-type mesh and hull templates, built lazily and cached.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::config::Theme;
use crate::die::DieType;
use crate::error::GeometryError;
use crate::hull::CollisionHull;
use crate::mesh::PolytopeMesh;
use crate::Real;

/// Template for one die type. Every live die clones the mesh (its face
/// groups may be rewritten) and shares the hull.
#[derive(Clone, Debug)]
pub struct DieTemplate {
    pub mesh: PolytopeMesh,
    pub hull: Arc<CollisionHull>,
}

impl DieTemplate {
    pub fn build(die: DieType, theme: &Theme, radius: Real) -> Result<Self, GeometryError> {
        let wrap = |source: GeometryError| GeometryError::Template {
            die,
            source: Box::new(source),
        };
        let mesh = PolytopeMesh::build(die, theme, radius).map_err(wrap)?;
        let hull = CollisionHull::for_die(die, radius).map_err(wrap)?;
        Ok(Self {
            mesh,
            hull: Arc::new(hull),
        })
    }
}

#[derive(Debug)]
pub struct TemplateCache {
    theme: Theme,
    radius: Real,
    templates: HashMap<DieType, DieTemplate>,
}

impl TemplateCache {
    pub fn new(theme: Theme, radius: Real) -> Self {
        Self {
            theme,
            radius,
            templates: HashMap::new(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Template for `die`, building it on first use.
    pub fn get(&mut self, die: DieType) -> Result<&DieTemplate, GeometryError> {
        match self.templates.entry(die) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                debug!("building {die} template");
                let template = DieTemplate::build(die, &self.theme, self.radius)?;
                Ok(slot.insert(template))
            }
        }
    }

    /// Switch theme; cached templates are dropped and rebuilt on demand.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme != self.theme {
            if !self.is_empty() {
                debug!("theme changed; dropping {} templates", self.len());
            }
            self.theme = theme;
            self.templates.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_built_once() {
        let mut cache = TemplateCache::new(Theme::default(), 1.0);
        let first = Arc::clone(&cache.get(DieType::D20).unwrap().hull);
        let second = Arc::clone(&cache.get(DieType::D20).unwrap().hull);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_theme_change_invalidates() {
        let mut cache = TemplateCache::new(Theme::default(), 1.0);
        cache.get(DieType::D6).unwrap();
        cache.set_theme(Theme::default());
        assert_eq!(cache.len(), 1);
        cache.set_theme(Theme {
            bevel: 0.0,
            ..Theme::default()
        });
        assert!(cache.is_empty());
        assert_eq!(cache.get(DieType::D6).unwrap().mesh.triangle_count(), 12);
    }

    #[test]
    fn test_template_errors_name_the_die() {
        let mut cache = TemplateCache::new(
            Theme {
                bevel: 50.0,
                ..Theme::default()
            },
            1.0,
        );
        match cache.get(DieType::D12) {
            Err(GeometryError::Template { die, .. }) => assert_eq!(die, DieType::D12),
            other => panic!("expected template error, got {other:?}"),
        }
    }
}
