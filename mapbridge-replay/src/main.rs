use fxhash::FxHashMap as HashMap;
use mapbridge::{
    engine::ProviderOptions,
    host::{HeadlessNode, PreloadedLoader},
    widget::BindOutcome,
    GoogleMapsEngine, LatLng, LeafletEngine, MapEngine, MapEvent, MapState, MapWidget,
    OpenLayersEngine, Provider, WidgetConfig,
};
use serde::Deserialize;
use serde_json::Value;

/// A recorded session: widget setup plus the server and user actions to replay
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    provider: Provider,
    #[serde(default)]
    state: MapState,
    #[serde(default)]
    options: Value,
    #[serde(default)]
    config: WidgetConfig,
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default = "library_available")]
    library_available: bool,
    #[serde(default)]
    steps: Vec<Step>,
}

fn library_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Command {
        command: String,
        #[serde(default)]
        args: Value,
    },
    Property {
        property: String,
        value: Value,
    },
    Click {
        click: LatLng,
    },
    MarkerClick {
        #[serde(rename = "clickMarker")]
        click_marker: usize,
    },
    Unbind {
        unbind: bool,
    },
}

/// Replays a scenario file and prints every outbound event as a JSON line
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: mapbridge-replay <scenario.json>")?;
    let scenario: Scenario = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    log::info!(
        "Replaying {} steps against {}",
        scenario.steps.len(),
        scenario.provider
    );

    match scenario.provider {
        Provider::OpenLayers => replay::<OpenLayersEngine>(scenario).await,
        Provider::Google => replay::<GoogleMapsEngine>(scenario).await,
        Provider::Leaflet => replay::<LeafletEngine>(scenario).await,
    }
}

async fn replay<E: MapEngine>(scenario: Scenario) -> Result<(), Box<dyn std::error::Error>> {
    let options = scenario_options::<E>(&scenario.options)?;

    let (tx, rx) = crossbeam_channel::unbounded::<MapEvent>();
    let mut widget = mapbridge::MapWidgetBuilder::<E>::new()
        .with_state(scenario.state)
        .with_options(options)
        .with_config(scenario.config)
        .with_sink(tx)
        .build();

    let mut node = HeadlessNode::new("mapbridge-replay");
    for (name, value) in scenario.attributes {
        node = node.with_attribute(name, value);
    }
    let loader = if scenario.library_available {
        PreloadedLoader::available()
    } else {
        PreloadedLoader::missing()
    };

    match widget.bind(&mut node, &loader) {
        BindOutcome::Loading(pending) => {
            let completion = pending.await;
            widget.complete_load(completion, &mut node);
        }
        BindOutcome::Failed => {
            log::error!("Bind failed: {}", node.error().unwrap_or("unknown error"));
        }
        BindOutcome::Bound | BindOutcome::Rejected => {}
    }

    for step in scenario.steps {
        apply(&mut widget, step);
        for event in rx.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    log::info!(
        "Finished in phase {:?} with {} markers",
        widget.phase(),
        widget.registry().len()
    );
    Ok(())
}

/// Builds provider options the way property pushes do, so presets such as
/// `tileProvider` fill in their dependent fields
fn scenario_options<E: MapEngine>(value: &Value) -> Result<E::Options, Box<dyn std::error::Error>> {
    let mut options = E::Options::default();
    let entries = match value {
        Value::Null => return Ok(options),
        Value::Object(entries) => entries,
        other => return Err(format!("scenario options must be an object, got {}", other).into()),
    };
    for (name, value) in entries {
        if !options.apply(name, value)? {
            log::warn!("Ignoring unknown option {}", name);
        }
    }
    Ok(options)
}

fn apply<E: MapEngine>(widget: &mut MapWidget<E>, step: Step) {
    match step {
        Step::Command { command, args } => {
            let outcome = widget.service(&command, &args);
            log::debug!("{} -> {:?}", command, outcome);
        }
        Step::Property { property, value } => {
            let outcome = widget.set_property(&property, &value);
            log::debug!("{} = {} -> {:?}", property, value, outcome);
        }
        Step::Click { click } => {
            widget.click_at(click);
        }
        Step::MarkerClick { click_marker } => {
            widget.click_marker(click_marker);
        }
        Step::Unbind { unbind } => {
            if unbind {
                widget.unbind();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapbridge::{engine::leaflet::LeafletOptions, layers::tile::TileProvider};
    use serde_json::json;

    #[test]
    fn test_tile_provider_option_selects_preset() {
        let options = scenario_options::<LeafletEngine>(&json!({"tileProvider": "carto"})).unwrap();
        let expected = LeafletOptions::for_provider(TileProvider::Carto);
        assert_eq!(options.tile_provider, TileProvider::Carto);
        assert_eq!(options.tile_url, expected.tile_url);
        assert_eq!(options.attribution, expected.attribution);
    }

    #[test]
    fn test_missing_options_use_defaults() {
        let options = scenario_options::<GoogleMapsEngine>(&Value::Null).unwrap();
        assert!(options.api_key.is_empty());
    }

    #[test]
    fn test_unknown_option_ignored() {
        let options =
            scenario_options::<GoogleMapsEngine>(&json!({"apiKey": "k", "colour": "red"})).unwrap();
        assert_eq!(options.api_key, "k");
    }

    #[test]
    fn test_non_object_options_rejected() {
        assert!(scenario_options::<LeafletEngine>(&json!(["carto"])).is_err());
    }
}
