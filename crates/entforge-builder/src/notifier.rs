/// Debug notifier entity generation
///
/// In debug builds each project gets one extra thing whose body summarizes
/// every entity compiled in that project, consumed by live-reload tooling.
/// The notifier's name is a freshly generated unique identifier so it can
/// never collide with a user-declared entity key and changes on every build.

use entforge_entities::EntityStore;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use uuid::Uuid;

use crate::error::Result;

pub fn notifier_name() -> String {
    Uuid::new_v4().to_string()
}

/// Render the notifier document: a thing stamped with the project name,
/// listing each compiled entity by kind and name.
pub fn notifier_xml(name: &str, project: &str, store: &EntityStore) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("Entities")))?;
    writer.write_event(Event::Start(BytesStart::new("Things")))?;

    let mut thing = BytesStart::new("Thing");
    thing.push_attribute(("name", name));
    thing.push_attribute(("projectName", project));
    thing.push_attribute(("tags", ""));
    writer.write_event(Event::Start(thing))?;

    writer.write_event(Event::Start(BytesStart::new("CompiledEntities")))?;
    for (_, entity) in store.emittable() {
        let mut element = BytesStart::new("Entity");
        element.push_attribute(("kind", entity.kind.collection()));
        element.push_attribute(("name", entity.name.as_str()));
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new("CompiledEntities")))?;

    writer.write_event(Event::End(BytesEnd::new("Thing")))?;
    writer.write_event(Event::End(BytesEnd::new("Things")))?;
    writer.write_event(Event::End(BytesEnd::new("Entities")))?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
