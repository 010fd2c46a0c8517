use super::{Client, Error};

impl Client {
    /// Uploads raw bytes into the attachments bucket under `path`.
    pub async fn upload_object(
        &self,
        token: &str,
        path: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        let req = self
            .http
            .post(format!(
                "{}/storage/v1/object/{}/{path}",
                self.url, self.bucket,
            ))
            .header("Content-Type", mime_type)
            .header("Cache-Control", "max-age=3600")
            .body(bytes);
        self.send(req, token).await.map(drop)
    }

    /// Public URL of an uploaded object; the bucket is world-readable.
    pub fn public_object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.url, self.bucket,
        )
    }
}
