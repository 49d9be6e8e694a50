use std::sync::Arc;

use nodeprobe_runner::prelude::ScenarioRegistry;

mod emptydir;
mod env100;
mod request_uri_too_large;
mod support;

/// Register every scenario shipped with nodeprobe.
pub fn register_all(registry: &mut ScenarioRegistry) {
    registry.add(Arc::new(env100::Env100));
    registry.add(Arc::new(emptydir::EmptyDir));
    registry.add(Arc::new(request_uri_too_large::RequestUriTooLarge));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn all_scenarios_are_registered_under_their_names() {
        let mut registry = ScenarioRegistry::new();
        register_all(&mut registry);
        assert_eq!(
            registry.names(),
            vec!["emptydir", "env100", "request-uri-too-large"]
        );
    }
}
