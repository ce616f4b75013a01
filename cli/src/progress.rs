use indicatif::{ProgressBar, ProgressStyle};

pub struct BatchBar {
    pb: ProgressBar,
    total_len: usize,
}

impl BatchBar {
    pub fn new(total: usize) -> Self {
        let sty = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} images")
            .progress_chars("##-");

        let pb = ProgressBar::new(total as u64);
        pb.set_style(sty);

        Self {
            pb,
            total_len: total,
        }
    }
}

impl Drop for BatchBar {
    fn drop(&mut self) {
        self.pb.finish();
    }
}

impl style_transfer::BatchProgress for BatchBar {
    fn update(&mut self, update: style_transfer::BatchUpdate) {
        if update.total != self.total_len {
            self.total_len = update.total;
            self.pb.set_length(self.total_len as u64);
        }

        self.pb.set_position(update.current as u64);
    }
}
