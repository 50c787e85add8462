use crate::projector::TableProjector;
use crate::resolver::ImageRowResolver;
use sheetrows_common::{ImageRef, Record, RecordValue};

/// Merges projected records with the images resolved for their rows.
pub struct RecordAssembler<'p, 'a> {
    projector: &'p TableProjector<'a>,
    resolver: &'p ImageRowResolver<'a>,
    image_replaces_text: bool,
}

impl<'p, 'a> RecordAssembler<'p, 'a> {
    pub fn new(
        projector: &'p TableProjector<'a>,
        resolver: &'p ImageRowResolver<'a>,
        image_replaces_text: bool,
    ) -> Self {
        Self {
            projector,
            resolver,
            image_replaces_text,
        }
    }

    /// Final records in projector order.
    pub fn assemble(&self) -> Vec<Record> {
        self.projector
            .rows()
            .map(|(index, mut record)| {
                for found in self.resolver.resolve(index + 1) {
                    let Some(header) = self.projector.header_for(found.column as usize) else {
                        continue;
                    };
                    self.attach(&mut record, header, ImageRef::from(found.asset));
                }
                record
            })
            .collect()
    }

    fn attach(&self, record: &mut Record, header: &str, image: ImageRef) {
        let Some(slot) = record.get_mut(header) else {
            record.insert(header, image);
            return;
        };
        match slot {
            RecordValue::Text(text) if !self.image_replaces_text && !text.is_empty() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(header = %header, image = %image.name, "text kept over image");
            }
            RecordValue::Text(_) => *slot = RecordValue::Image(image),
            RecordValue::Image(first) => {
                let first = first.clone();
                *slot = RecordValue::Images(vec![first, image]);
            }
            RecordValue::Images(all) => all.push(image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TableOptions;
    use sheetrows_common::{CellPos, ImageAnchor, ImageAsset, SheetGrid};

    struct Fixture {
        grid: SheetGrid,
        images: Vec<ImageAsset>,
        anchors: Vec<ImageAnchor>,
    }

    impl Fixture {
        fn new(rows: Vec<Vec<&str>>) -> Self {
            Self {
                grid: SheetGrid::from_rows("S", rows),
                images: Vec::new(),
                anchors: Vec::new(),
            }
        }

        fn image(mut self, name: &str, from: (u32, u32), to: (u32, u32)) -> Self {
            if !self.images.iter().any(|a| a.name == name) {
                self.images
                    .push(ImageAsset::new(name, "image/png", name.as_bytes().to_vec()));
            }
            self.anchors.push(ImageAnchor::new(
                name,
                "S",
                CellPos::new(from.0, from.1),
                CellPos::new(to.0, to.1),
            ));
            self
        }

        fn assemble(&self, opts: &TableOptions) -> Vec<Record> {
            let projector = TableProjector::new(&self.grid, opts).unwrap();
            let resolver = ImageRowResolver::new(&self.images, &self.anchors, "S");
            RecordAssembler::new(&projector, &resolver, opts.image_replaces_text).assemble()
        }
    }

    #[test]
    fn image_replaces_colocated_text() {
        let f = Fixture::new(vec![vec!["name", "photo"], vec!["apple", "see photo"]])
            .image("image1.png", (1, 1), (1, 1));
        let recs = f.assemble(&TableOptions::new());
        let photo = recs[0].get("photo").unwrap();
        assert_eq!(photo.as_image().unwrap().name, "image1.png");
        assert_eq!(recs[0].get("name").unwrap().as_text(), Some("apple"));
    }

    #[test]
    fn text_can_be_kept_over_images() {
        let f = Fixture::new(vec![vec!["photo", "alt"], vec!["see photo", ""]])
            .image("a.png", (0, 1), (0, 1))
            .image("b.png", (1, 1), (1, 1));
        let recs = f.assemble(&TableOptions::new().image_replaces_text(false));
        assert_eq!(recs[0].get("photo").unwrap().as_text(), Some("see photo"));
        // Empty text still yields to the image.
        assert_eq!(recs[0].get("alt").unwrap().as_image().unwrap().name, "b.png");
    }

    #[test]
    fn colliding_images_become_a_sequence_in_column_order() {
        let f = Fixture::new(vec![vec!["photo", "photo", "photo"], vec!["", "", ""]])
            .image("c.png", (2, 1), (2, 1))
            .image("a.png", (0, 1), (0, 1))
            .image("b.png", (1, 1), (1, 3));
        let recs = f.assemble(&TableOptions::new());
        let names: Vec<_> = recs[0]
            .get("photo")
            .unwrap()
            .images()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn two_images_on_one_header_make_a_pair() {
        let f = Fixture::new(vec![vec!["photo", "photo"], vec!["", ""]])
            .image("a.png", (0, 1), (0, 1))
            .image("b.png", (1, 1), (1, 1));
        let recs = f.assemble(&TableOptions::new());
        match recs[0].get("photo").unwrap() {
            RecordValue::Images(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].name, "a.png");
                assert_eq!(list[1].name, "b.png");
            }
            other => panic!("expected an image sequence, got {other:?}"),
        }
    }

    #[test]
    fn images_outside_headers_are_ignored() {
        let f = Fixture::new(vec![vec!["name", ""], vec!["apple", ""]])
            .image("a.png", (1, 1), (1, 1))
            .image("b.png", (7, 1), (7, 1));
        let recs = f.assemble(&TableOptions::new());
        assert_eq!(recs[0].len(), 1);
        assert_eq!(recs[0].get("name").unwrap().as_text(), Some("apple"));
    }

    #[test]
    fn images_follow_mapped_headers() {
        let f = Fixture::new(vec![vec!["Photo"], vec![""]]).image("a.png", (0, 1), (0, 1));
        let recs = f.assemble(&TableOptions::new().map_header("Photo", "image"));
        assert!(recs[0].get("image").unwrap().is_image());
        assert!(recs[0].get("Photo").is_none());
    }

    #[test]
    fn images_on_skipped_rows_are_not_attached() {
        let f = Fixture::new(vec![vec!["photo"], vec![""], vec![""]])
            .image("a.png", (0, 0), (0, 0))
            .image("b.png", (0, 1), (0, 1))
            .image("c.png", (0, 2), (0, 2));
        let recs = f.assemble(&TableOptions::new().skip_row(1));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].get("photo").unwrap().as_image().unwrap().name, "c.png");
    }

    #[test]
    fn floating_image_lands_on_top_row_only() {
        let f = Fixture::new(vec![vec!["photo"], vec!["r1"], vec!["r2"], vec!["r3"]])
            .image("a.png", (0, 1), (0, 3));
        let recs = f.assemble(&TableOptions::new());
        assert!(recs[0].get("photo").unwrap().is_image());
        assert_eq!(recs[1].get("photo").unwrap().as_text(), Some("r2"));
        assert_eq!(recs[2].get("photo").unwrap().as_text(), Some("r3"));
    }
}
