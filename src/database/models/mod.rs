pub mod jenjang;
pub mod kategori;
pub mod modul;

pub use jenjang::{Jenjang, JenjangWithCount};
pub use kategori::KategoriWithCount;
pub use modul::{Modul, ModulWithJenjang, NewModul};
