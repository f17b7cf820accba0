pub mod audio_buffer;
pub mod gateway;
pub mod http;
pub mod interceptor;
pub mod registry;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use audio_buffer::{AudioBuffer, AudioBufferError};
pub use gateway::{SttGateway, TtsGateway};
pub use interceptor::{EchoInterceptor, InterceptorError, TranscriptInterceptor};
pub use registry::{
    ProviderDescriptor, ProviderRegistry, ProviderRole, ProviderSettings, RegistryError,
};

pub use stt::{
    BaseSTT, STTError, SttProvider, create_stt_provider, get_supported_stt_providers,
};

pub use tts::{
    AudioStream, BaseTTS, TTSError, TtsProvider, create_tts_provider, get_supported_tts_providers,
};
