use std::path::Path;

use crate::domain::image::Image;
use crate::infrastructure::error::InfrastructureError;

// ファイルとの入出力はインフラ層で実装する
pub trait ImageCodec {
    fn load(&self, path: &Path) -> Result<Image, InfrastructureError>;

    fn save(&self, image: &Image, path: &Path) -> Result<(), InfrastructureError>;
}
