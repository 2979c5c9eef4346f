pub mod credentials;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod normalize;
pub mod prompt;
pub mod settings;

use room_core::{HistoryEntry, SceneObject, SceneStore};
use serde_json::Value;
use tracing::debug;

pub use credentials::{
    CredentialError, CredentialStore, CredentialStoreError, KeyringCredentialStore,
    MemoryCredentialStore, validate_api_key,
};
pub use error::{GenerationError, PlacementError};
pub use extract::{extract_json, strip_code_fence};
pub use gemini::GeminiClient;
pub use normalize::{NormalizeError, NormalizerConfig, PLACEHOLDER_TYPE, TypePolicy, normalize};
pub use prompt::{EMPTY_ROOM_MARKER, PlacementRequest, build_request, room_context};
pub use settings::{GenerationConfig, RetryPolicy, Settings, SettingsError, load_settings};

/// Sample prompts (Polish, like the catalog keywords) for quick manual testing.
pub const DEMO_PROMPTS: [&str; 8] = [
    "szara kanapa w lewym rogu",
    "czerwone krzesło na środku",
    "białe łóżko przy ścianie",
    "czarna lampa w prawym rogu",
    "brązowa szafa przy lewej ścianie",
    "brązowy stół na środku pokoju",
    "niebieskie krzesło obok stołu",
    "różowa kanapa przy prawej ścianie",
];

pub fn demo_prompts() -> &'static [&'static str] {
    &DEMO_PROMPTS
}

#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub api_key: &'a str,
    pub system_text: &'a str,
    pub user_text: &'a str,
}

/// A text-generation backend. One call is one attempt.
pub trait LanguageModel {
    fn generate(&mut self, request: GenerationRequest<'_>) -> Result<String, GenerationError>;
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn generate(&mut self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        (**self).generate(request)
    }
}

/// Runs one placement without touching any store: credential check, request
/// composition, generation, extraction and normalization.
pub fn place_object<C: LanguageModel + ?Sized>(
    client: &mut C,
    api_key: Option<&str>,
    user_text: &str,
    existing: &[SceneObject],
    config: &NormalizerConfig,
) -> Result<SceneObject, PlacementError> {
    let api_key = validate_api_key(api_key)?;
    let request = build_request(user_text, existing);
    debug!(existing = existing.len(), "composed placement request");

    let completion = client.generate(GenerationRequest {
        api_key,
        system_text: &request.system_text,
        user_text: &request.user_text,
    })?;
    interpret_completion(&completion, config)
}

/// Turns raw completion text into a scene object.
pub fn interpret_completion(
    completion: &str,
    config: &NormalizerConfig,
) -> Result<SceneObject, PlacementError> {
    let candidate = extract_json(completion).ok_or(PlacementError::Extraction)?;
    let parsed: Value =
        serde_json::from_str(candidate).map_err(|err| PlacementError::Parse(err.to_string()))?;
    normalize(&parsed, config).map_err(|err| PlacementError::Parse(err.to_string()))
}

/// One design session: a generation client, its settings, the API key and
/// the room being furnished.
pub struct RoomDesigner<C: LanguageModel> {
    client: C,
    settings: Settings,
    api_key: Option<String>,
    store: SceneStore,
}

impl<C: LanguageModel> RoomDesigner<C> {
    pub fn init(client: C, settings: Settings, api_key: Option<String>) -> Self {
        Self {
            client,
            settings,
            api_key,
            store: SceneStore::new(),
        }
    }

    /// Validates the prompt's result end to end and appends it to the room.
    /// On any error the room is left exactly as it was.
    pub fn submit_prompt(&mut self, text: &str) -> Result<SceneObject, PlacementError> {
        let object = place_object(
            &mut self.client,
            self.api_key.as_deref(),
            text,
            self.store.objects(),
            &self.settings.normalizer,
        )?;
        self.store.append(object.clone(), text);
        Ok(object)
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<(), CredentialError> {
        let key = validate_api_key(Some(key))?;
        self.api_key = Some(key.to_string());
        Ok(())
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn remove_last(&mut self) -> Option<(SceneObject, HistoryEntry)> {
        self.store.remove_last()
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<(SceneObject, HistoryEntry)> {
        self.store.remove_by_id(id)
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_client(self) -> C {
        self.client
    }
}
