use error_stack::{Context, Report};

// figment errors carry the offending key and provider in separate
// fields, which the plain `Display` impl leaves out.
pub trait FigmentErrorAttachable<T: Context> {
  fn attach_figment_error(self, err: figment::Error) -> Report<T>;
}

impl<T: Context> FigmentErrorAttachable<T> for Report<T> {
  fn attach_figment_error(self, error: figment::Error) -> Report<T> {
    let mut this = self;
    for e in error {
      this = this.attach_printable(e.kind.to_string());

      if let (Some(profile), Some(md)) = (&e.profile, &e.metadata) {
        if !e.path.is_empty() {
          let key = md.interpolate(profile, &e.path);
          this = this.attach_printable(format!("for key {key:?}"));
        }
      }

      if let Some(md) = &e.metadata {
        this = match &md.source {
          Some(source) => this.attach_printable(format!("in {source} {}", md.name)),
          None => this.attach_printable(format!("in {}", md.name)),
        };
      }
    }
    this
  }
}
