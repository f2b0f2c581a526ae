//! Query surface shared by layers, scenes and the scene manager
//!
//! Type queries accept concrete component types as well as `dyn`
//! capabilities. Results follow update order: scenes in registration order,
//! layers by priority, entities by insertion.

use super::component::ComponentRef;
use super::entity::Entity;
use super::layer::Layer;
use super::scene::Scene;
use super::type_registry::TypeKey;

/// Aggregate lookups over a group of entities
pub trait EntityQuery {
    /// Every live entity in the group, in update order
    fn query_entities(&self) -> Vec<Entity>;

    /// Every component registered under `C`, one per entity
    fn components_of_type<C: ?Sized + 'static>(&self) -> Vec<ComponentRef> {
        let key = TypeKey::of::<C>();
        self.query_entities()
            .iter()
            .filter_map(|entity| entity.get_by_key(key))
            .collect()
    }

    /// Number of entities with a component registered under `C`
    fn count_of_type<C: ?Sized + 'static>(&self) -> usize {
        self.query_entities()
            .iter()
            .filter(|entity| entity.has_component::<C>())
            .count()
    }

    /// Whether any entity has a component registered under `C`
    fn has_of_type<C: ?Sized + 'static>(&self) -> bool {
        self.query_entities()
            .iter()
            .any(|entity| entity.has_component::<C>())
    }

    /// First component registered under `C`
    fn first_of_type<C: ?Sized + 'static>(&self) -> Option<ComponentRef> {
        let key = TypeKey::of::<C>();
        self.query_entities()
            .iter()
            .find_map(|entity| entity.get_by_key(key))
    }

    /// Entities carrying `tag`
    fn entities_with_tag(&self, tag: &str) -> Vec<Entity> {
        self.query_entities()
            .into_iter()
            .filter(|entity| entity.has_tag(tag))
            .collect()
    }

    /// Number of entities carrying `tag`
    fn count_with_tag(&self, tag: &str) -> usize {
        self.query_entities()
            .iter()
            .filter(|entity| entity.has_tag(tag))
            .count()
    }

    /// Whether any entity carries `tag`
    fn has_tagged(&self, tag: &str) -> bool {
        self.query_entities().iter().any(|entity| entity.has_tag(tag))
    }

    /// First entity carrying `tag`
    fn first_with_tag(&self, tag: &str) -> Option<Entity> {
        self.query_entities()
            .into_iter()
            .find(|entity| entity.has_tag(tag))
    }

    /// First entity with the given name
    fn entity_named(&self, name: &str) -> Option<Entity> {
        self.query_entities()
            .into_iter()
            .find(|entity| entity.name() == name)
    }
}

impl EntityQuery for Layer {
    fn query_entities(&self) -> Vec<Entity> {
        self.entities()
            .into_iter()
            .filter(|entity| !entity.is_destroyed())
            .collect()
    }
}

impl EntityQuery for Scene {
    fn query_entities(&self) -> Vec<Entity> {
        self.layers()
            .iter()
            .flat_map(|layer| layer.query_entities())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_type;
    use crate::ecs::Component;

    trait Enemy: Component {}

    struct Grunt;
    impl Component for Grunt {}
    impl Enemy for Grunt {}
    component_type!(Grunt: dyn Enemy);

    struct Boss;
    impl Component for Boss {}
    impl Enemy for Boss {}
    component_type!(Boss: dyn Enemy);

    fn populated() -> Scene {
        let scene = Scene::new("arena");
        let ground = scene.create_layer("ground", 0).unwrap();
        let sky = scene.create_layer("sky", 10).unwrap();

        let grunt = Entity::with_name(&ground, "grunt").unwrap();
        grunt.add_component(Grunt).unwrap();
        grunt.add_tag("enemy");

        let boss = Entity::with_name(&sky, "boss").unwrap();
        boss.add_component(Boss).unwrap();
        boss.add_tag("enemy");
        boss.add_tag("boss");

        Entity::with_name(&ground, "rock").unwrap();
        scene
    }

    #[test]
    fn test_type_queries_across_layers() {
        let scene = populated();

        assert_eq!(scene.count_of_type::<dyn Enemy>(), 2);
        assert_eq!(scene.components_of_type::<Grunt>().len(), 1);
        assert!(scene.has_of_type::<Boss>());

        // Higher priority layer comes first
        let first = scene.first_of_type::<dyn Enemy>().unwrap();
        assert!(first.is::<Boss>());

        let ground = scene.layer("ground").unwrap();
        assert_eq!(ground.count_of_type::<dyn Enemy>(), 1);
        assert!(!ground.has_of_type::<Boss>());
    }

    #[test]
    fn test_tag_and_name_queries() {
        let scene = populated();

        assert_eq!(scene.count_with_tag("enemy"), 2);
        assert_eq!(scene.entities_with_tag("boss").len(), 1);
        assert!(!scene.has_tagged("friend"));
        assert_eq!(scene.first_with_tag("enemy").unwrap().name(), "boss");
        assert!(scene.entity_named("rock").is_some());
        assert!(scene.entity_named("ghost").is_none());
    }

    #[test]
    fn test_destroyed_entities_are_excluded() {
        let scene = populated();
        let boss = scene.entity_named("boss").unwrap();
        boss.destroy_entity();

        assert_eq!(scene.count_of_type::<dyn Enemy>(), 1);
        assert!(!scene.has_tagged("boss"));
    }
}
