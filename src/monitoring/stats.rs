use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct CspStats {
    request_count: AtomicUsize,
    header_count: AtomicUsize,
    nonce_generation_count: AtomicUsize,
    nonce_adoption_count: AtomicUsize,
    unforwarded_mount_count: AtomicUsize,
    header_generation_time_ns: AtomicUsize,
    start_time: Instant,
}

impl Default for CspStats {
    fn default() -> Self {
        Self {
            request_count: Default::default(),
            header_count: Default::default(),
            nonce_generation_count: Default::default(),
            nonce_adoption_count: Default::default(),
            unforwarded_mount_count: Default::default(),
            header_generation_time_ns: Default::default(),
            start_time: Instant::now(),
        }
    }
}

impl CspStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn header_count(&self) -> usize {
        self.header_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nonce_generation_count(&self) -> usize {
        self.nonce_generation_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nonce_adoption_count(&self) -> usize {
        self.nonce_adoption_count.load(Ordering::Relaxed)
    }

    /// Upgraded sessions that started without a forwarded nonce.
    #[inline]
    pub fn unforwarded_mount_count(&self) -> usize {
        self.unforwarded_mount_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn avg_header_generation_time_ns(&self) -> f64 {
        let count = self.header_count.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            self.header_generation_time_ns.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    #[inline]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    #[inline]
    pub(crate) fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_header_count(&self) {
        self.header_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_nonce_generation_count(&self) {
        self.nonce_generation_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_nonce_adoption_count(&self) {
        self.nonce_adoption_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_unforwarded_mount_count(&self) {
        self.unforwarded_mount_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_header_generation_time(&self, time_ns: usize) {
        self.header_generation_time_ns
            .fetch_add(time_ns, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.request_count.store(0, Ordering::Relaxed);
        self.header_count.store(0, Ordering::Relaxed);
        self.nonce_generation_count.store(0, Ordering::Relaxed);
        self.nonce_adoption_count.store(0, Ordering::Relaxed);
        self.unforwarded_mount_count.store(0, Ordering::Relaxed);
        self.header_generation_time_ns.store(0, Ordering::Relaxed);
    }
}

impl fmt::Display for CspStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CSP Middleware Statistics:")?;
        writeln!(f, "  Uptime: {} seconds", self.uptime_secs())?;
        writeln!(f, "  Requests processed: {}", self.request_count())?;
        writeln!(f, "  Headers built: {}", self.header_count())?;
        writeln!(f, "  Nonces generated: {}", self.nonce_generation_count())?;
        writeln!(f, "  Nonces adopted: {}", self.nonce_adoption_count())?;
        writeln!(
            f,
            "  Sessions mounted without nonce: {}",
            self.unforwarded_mount_count()
        )?;
        writeln!(
            f,
            "  Average header generation time: {:.2} ns",
            self.avg_header_generation_time_ns()
        )?;
        Ok(())
    }
}
