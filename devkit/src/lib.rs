/*!
# EdgeSense DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant le développement du pipeline EdgeSense avec:
- Stub MQTT pour tests sans broker
- Builders de messages télémétrie et configuration
- Harness de test avec assertions sur les échanges
*/

pub mod mqtt_stub;
pub mod test_utils;

pub use mqtt_stub::{EdgeMessageBuilder, MockMqttClient};
pub use test_utils::TestHarness;
