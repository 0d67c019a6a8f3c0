use std::collections::HashMap;

pub const HEADER_TEMPLATE: &str = include_str!("../templates/header.tex");
pub const CHAPTER_TEMPLATE: &str = include_str!("../templates/chapter.tex");
pub const TRAILER_TEMPLATE: &str = include_str!("../templates/trailer.tex");
pub const FOOTER_TEMPLATE: &str = include_str!("../templates/footer.tex");
pub const AUTODEFINED_HEADER: &str =
  include_str!("../templates/autodefined.sty");

pub const PREAMBLE_TEX: &str = include_str!("../templates/styles/preamble.tex");

/// Name of the folder the LaTeX styles live in, relative to the build folder.
pub const STYLES_DIR: &str = "styles";

/// File name of the generated style with repository and package commands.
pub const AUTODEFINED_STY: &str = "autodefined.sty";

/// Style files written into the `styles` folder of every build.
#[must_use]
pub fn style_files() -> HashMap<&'static str, &'static str> {
  let mut styles = HashMap::new();
  styles.insert("preamble.tex", PREAMBLE_TEX);
  styles
}
