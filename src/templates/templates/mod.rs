// Exportar todas las plantillas disponibles

mod classic;
mod custom;
mod luxury;
mod modern;

pub use classic::ClassicTemplate;
pub use custom::CustomTemplate;
pub use luxury::LuxuryTemplate;
pub use modern::ModernTemplate;
