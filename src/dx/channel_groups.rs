//! Channel groups module.
//!
//! Manage list of channels which are registered in channel group.
//! Requests are queued to the non-subscribe worker pool and service response
//! is delivered to success sink as is.

use log::debug;

use crate::{
    core::{
        utils::encoding::url_encode, PubNubError, ResponseSink, Transport, TransportRequest,
    },
    dx::{
        pubnub_client::PubNubClientInstance,
        worker_pool::{JobKind, NonSubscribeJob},
    },
};

/// Channel group operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOperation {
    Add,
    Remove,
    List,
    Delete,
}

impl<T> PubNubClientInstance<T>
where
    T: Transport + 'static,
{
    /// Add channels to channel group.
    ///
    /// Group is created when it doesn't exist yet.
    pub fn channel_group_add_channels<S>(
        &self,
        group: &str,
        channels: &[S],
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        self.channel_group_request(GroupOperation::Add, group, channels, success, error);
    }

    /// Remove channels from channel group.
    pub fn channel_group_remove_channels<S>(
        &self,
        group: &str,
        channels: &[S],
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        self.channel_group_request(GroupOperation::Remove, group, channels, success, error);
    }

    /// List channels registered in channel group.
    pub fn channel_group_list_channels(
        &self,
        group: &str,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        self.channel_group_request::<&str>(GroupOperation::List, group, &[], success, error);
    }

    /// Remove channel group with all its channels.
    pub fn channel_group_remove_group(
        &self,
        group: &str,
        success: ResponseSink,
        error: ResponseSink,
    ) {
        self.channel_group_request::<&str>(GroupOperation::Delete, group, &[], success, error);
    }

    fn channel_group_request<S>(
        &self,
        operation: GroupOperation,
        group: &str,
        channels: &[S],
        success: ResponseSink,
        error: ResponseSink,
    ) where
        S: AsRef<str>,
    {
        let mut job = NonSubscribeJob {
            target: group.to_string(),
            request: TransportRequest::default(),
            kind: JobKind::Verbatim,
            success,
            error,
        };

        match self.channel_group_transport_request(operation, group, channels) {
            Ok(request) => {
                debug!("Channel group {operation:?} request for '{group}'");
                job.request = request;
                self.enqueue(job);
            }
            Err(err) => job.fail(&err),
        }
    }

    fn channel_group_transport_request<S>(
        &self,
        operation: GroupOperation,
        group: &str,
        channels: &[S],
    ) -> Result<TransportRequest, PubNubError>
    where
        S: AsRef<str>,
    {
        if group.trim().is_empty() {
            return Err(PubNubError::EmptyChannel);
        }

        let channels = channels
            .iter()
            .map(|channel| channel.as_ref().trim())
            .filter(|channel| !channel.is_empty())
            .collect::<Vec<_>>();
        let mut path = format!(
            "/v1/channel-registration/sub-key/{}/channel-group/{}",
            self.config.subscribe_key,
            url_encode(group.as_bytes())
        );
        let mut request = TransportRequest::default();

        match operation {
            GroupOperation::Add | GroupOperation::Remove if channels.is_empty() => {
                return Err(PubNubError::EmptyChannel)
            }
            GroupOperation::Add => {
                request
                    .query_parameters
                    .insert("add".into(), channels.join(","));
            }
            GroupOperation::Remove => {
                request
                    .query_parameters
                    .insert("remove".into(), channels.join(","));
            }
            GroupOperation::List => {}
            GroupOperation::Delete => path.push_str("/remove"),
        }

        request.path = path;
        Ok(request)
    }
}
